use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Game field has no cells")]
    Empty,
    #[error("Column {column} has {found} cells, expected {expected}")]
    Jagged { column: usize, expected: usize, found: usize },
    #[error("Game field has no start cell")]
    MissingStart,
    #[error("Game field has {0} start cells, expected exactly one")]
    MultipleStarts(usize),
    #[error("Game field has no finish cell")]
    MissingFinish,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("Level number {0:?} must be 1 to 5 characters long")]
    BadNumber(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Could not access level pack: {0}")]
    Io(#[from] std::io::Error),
    #[error("Level pack is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Root element is <{0}>, expected <level-pack>")]
    UnexpectedRoot(String),
    #[error("Level pack contains no levels")]
    EmptyPack,
    #[error("Unexpected element <{tag}> inside <{parent}>")]
    UnexpectedElement { parent: String, tag: String },
    #[error("Level {level} has no <game-field>")]
    MissingGameField { level: String },
    #[error("Level {level} contains unknown cell <{tag}>")]
    UnknownCell { level: String, tag: String },
    #[error("Level {level} has completed={value:?}, expected true or false")]
    BadCompleted { level: String, value: String },
    #[error("Level {number} is invalid: {source}")]
    Level {
        number: String,
        #[source]
        source: LevelError,
    },
}

pub type PackResult<T> = Result<T, PackError>;

/// A frame handler failed. The timer is already stopped when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError<E: std::error::Error + 'static> {
    #[error("Frame handler failed: {0}")]
    Frame(#[source] E),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("Step target ({x}, {y}) is outside the {width}x{height} field")]
    OutsideField { x: usize, y: usize, width: usize, height: usize },
}
