pub mod learning;
pub mod vocabulary;
