use thiserror::Error;

/// Errors raised while fetching a page over HTTP
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("Server returned HTTP {0}")]
    Status(u16),

    /// DNS, connection, TLS or body errors
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    /// Error building the HTTP client
    #[error("Could not build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Reasons a recipe could not be extracted from a page
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The page could not be downloaded
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] FetchError),

    /// The page was fetched but carried no recognisable recipe
    #[error("No recipe found on this page")]
    NoRecipeFound,

    /// Recipe data was present but had an unexpected shape
    #[error("Malformed recipe data: {0}")]
    Malformed(String),
}

impl ExtractError {
    /// True when the failure came from the network rather than the page content
    pub fn is_network(&self) -> bool {
        matches!(self, ExtractError::Fetch(_))
    }
}

/// Errors from the persisted meal table
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed meal table: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors surfaced to the person using the decider
#[derive(Error, Debug)]
pub enum DeciderError {
    /// A meal was saved without a name
    #[error("Please enter a meal name.")]
    EmptyName,

    /// A meal with the same name (ignoring case) already exists
    #[error("\"{0}\" is already in the cookbook.")]
    DuplicateName(String),

    /// No meal with this name
    #[error("No meal named \"{0}\".")]
    UnknownMeal(String),

    /// Ratings are whole numbers from 1 to 5
    #[error("Rating must be between 1 and 5, got {0}.")]
    InvalidScore(u8),

    /// The meal table has no rows
    #[error("The cookbook is empty!")]
    EmptyCookbook,

    /// Filters excluded every meal
    #[error("No meals match those filters.")]
    NoMatch,

    /// Wrong admin password
    #[error("Incorrect admin password.")]
    WipeDenied,

    /// No admin password configured, so wiping is switched off
    #[error("Wiping is disabled until an admin password is configured.")]
    WipeDisabled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Session file error: {0}")]
    Session(String),
}
