use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a deck transformation.
///
/// None of these are retried; the page is either fully transformed or left
/// as the caller handed it in (apart from nodes already moved by the builder
/// when the failure comes from the presentation library).
#[derive(Debug, Error)]
pub enum DeckError {
    /// No element carries the class of the container that should be hidden.
    #[error("no element with class '{class}' to hide")]
    MissingContainer {
        /// The class that was searched for.
        class: String,
    },

    /// The content root id is absent or the element has no element child.
    #[error("content root '#{id}' is missing or has no element child")]
    MissingRoot {
        /// The id that was searched for.
        id: String,
    },

    /// The document has no `<body>` to mount the deck on.
    #[error("document has no <body> element")]
    MissingBody,

    /// A cell marker's text is not valid JSON.
    #[error("malformed cell metadata: {source}")]
    MalformedMetadata {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The presentation library could not be constructed.
    #[error("presentation library unavailable: {reason}")]
    PresentationUnavailable {
        /// Why construction failed.
        reason: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid config file at {}: {source}", path.display())]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// What went wrong reading or parsing it. JSON errors are carried
        /// through their `io::Error` conversion.
        #[source]
        source: std::io::Error,
    },
}
