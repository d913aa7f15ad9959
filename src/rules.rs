mod util;

pub mod doc_link;
pub mod execute_eval;
pub mod extension_env;
pub mod modality;

// Code style lints
pub use doc_link::LinkPartCommentSpaceLint;
pub use modality::DontUseModalityModeLint;

// Security lints
pub use execute_eval::RestrictionExecuteEvalServerLint;

// Compatibility lints
pub use extension_env::ExtensionMethodVisibleModeLint;
