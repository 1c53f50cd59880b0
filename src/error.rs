use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(ParseErrors),

    #[error("No availability zones matched {zones:?} for instance type {instance_type}")]
    NoMatchingZones {
        instance_type: String,
        zones: Vec<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, PricingError>;

// ---------------------------------------------------------------------------
// ParseError — one malformed upstream record
// ---------------------------------------------------------------------------

/// The stage at which a pricing record could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("pricing record is malformed: {0}")]
    Malformed(String),

    #[error("unable to find product attributes")]
    MissingAttributes,

    #[error("unable to find instance type name in product attributes")]
    MissingInstanceType,

    #[error("unable to find pricing terms")]
    MissingTerms,

    #[error("unable to find on-demand pricing terms")]
    MissingOnDemandTerms,

    #[error("unable to find on-demand pricing dimensions")]
    MissingPriceDimensions,

    #[error("unable to find on-demand price per unit in pricing dimensions")]
    MissingPricePerUnit,

    #[error("unable to find on-demand price per unit in USD")]
    MissingUsdPrice,

    #[error("could not convert price per unit in USD {0:?} to a non-negative number")]
    InvalidUsdPrice(String),

    #[error("could not convert spot price {0:?} to a non-negative number")]
    InvalidSpotPrice(String),
}

/// A single record that failed to parse, paired with whatever instance type
/// name was recovered before the failure (empty if none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub instance_type: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(instance_type: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            instance_type: instance_type.into(),
            kind,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_type.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} ({})", self.kind, self.instance_type)
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// ParseErrors — aggregate of every failed record in one pass
// ---------------------------------------------------------------------------

/// Parse failures accumulated over a multi-record pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors(Vec<ParseError>);

impl ParseErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, err: ParseError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, otherwise the whole aggregate as a [`PricingError::Parse`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PricingError::Parse(self))
        }
    }
}

impl From<ParseError> for ParseErrors {
    fn from(err: ParseError) -> Self {
        Self(vec![err])
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ParseErrors {}
