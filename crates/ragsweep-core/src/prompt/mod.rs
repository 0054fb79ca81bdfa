pub mod assemble;
pub mod registry;
pub mod template;

pub use assemble::build_messages;
pub use registry::{
    builtin, derive_variants, PromptRegistry, PromptTemplate, PromptVariant, BUILTIN_NAMES,
    FINAL_ANSWER_MARKER,
};
pub use template::render;
