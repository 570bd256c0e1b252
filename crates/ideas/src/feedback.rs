//! Interactive 1-5 ratings for composed ideas.

use std::io::{BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composer::ComposedIdea;
use crate::export::ExportError;

pub const INVALID_RATING: &str = "Please enter a number between 1 and 5.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: String,
    pub rating: u8,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Input closed before every idea was rated")]
    InputClosed,

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Export(#[from] ExportError),
}

fn parse_rating(line: &str) -> Option<u8> {
    line.trim().parse::<u8>().ok().filter(|r| (1..=5).contains(r))
}

/// Prompt for a rating of each idea on `output`, reading answers from
/// `input` until each one is a whole number from 1 to 5.
pub fn collect_ratings<R: BufRead, W: Write>(
    ideas: &[ComposedIdea],
    mut input: R,
    mut output: W,
) -> Result<Vec<Rating>, FeedbackError> {
    let mut ratings = Vec::with_capacity(ideas.len());
    for idea in ideas {
        let rating = loop {
            write!(output, "Rate idea '{}' (1-5): ", idea.title)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(FeedbackError::InputClosed);
            }
            match parse_rating(&line) {
                Some(rating) => break rating,
                None => writeln!(output, "{INVALID_RATING}")?,
            }
        };
        ratings.push(Rating {
            id: idea.id.clone(),
            rating,
        });
    }
    Ok(ratings)
}

/// Persist ratings as a pretty-printed JSON array.
pub fn save_ratings(ratings: &[Rating], path: &Path) -> Result<(), FeedbackError> {
    let body = serde_json::to_string_pretty(ratings).map_err(ExportError::from)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, body).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), count = ratings.len(), "Saved feedback");
    Ok(())
}
