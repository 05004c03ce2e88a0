pub mod typescript;

pub use typescript::TypeScriptCollector;
