//! Document retrieval: splitting at ingestion time, assembly at query time.

pub mod assembler;
pub mod chunker;

pub use assembler::{
    AssembledContext, AssemblyPolicy, NO_RELEVANT_DOCUMENTS, RetrievalAssembler, RetrievalStats, assemble,
};
pub use chunker::ChunkingPolicy;
