use miette::Diagnostic;
use thiserror::Error;

use crate::errors::FolioError;

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("Failed to read seed file `{path}`")]
    #[diagnostic(
        code(folio::seed::read),
        help("Check that the file exists and is readable")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(folio::seed::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev")
    )]
    KdlParse(String),

    #[error("Invalid role: {0}")]
    #[diagnostic(
        code(folio::seed::invalid_role),
        help("Role syntax: role \"CODE\" name=\"Name\" level=0 {{ grants {{ - \"feature:action\" }} }}")
    )]
    InvalidRole(String),

    #[error("Invalid user: {0}")]
    #[diagnostic(
        code(folio::seed::invalid_user),
        help("User syntax: user \"username\" email=\"..\" name=\"..\" password=\"..\" role=\"CODE\"")
    )]
    InvalidUser(String),

    #[error("User `{user}` references undefined role `{role}`")]
    #[diagnostic(code(folio::seed::undefined_role))]
    UndefinedRole { user: String, role: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] FolioError),
}
