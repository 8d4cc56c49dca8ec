use thiserror::Error;

/// Everything that can go wrong while building or querying a theory.
///
/// Unsatisfiability is not among them: [`crate::Theory::solve`] reports it as
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A constraint was added to, or `compile` called on, an encoding that
    /// has already been compiled.
    #[error("the encoding has already been compiled")]
    AlreadyCompiled,

    /// Two different propositions render to the same label.
    #[error("proposition `{label}` is defined twice with different meanings")]
    DuplicateDefinition { label: String },

    #[error("malformed formula: {0}")]
    MalformedFormula(&'static str),

    /// Likelihood was requested on a theory without models.
    #[error("likelihood is undefined for an unsatisfiable theory")]
    UndefinedLikelihood,

    #[error("search interrupted")]
    Interrupted,

    #[error("variable limit of the registry exceeded")]
    VariableLimit,
}

pub type Result<T> = std::result::Result<T, Error>;
