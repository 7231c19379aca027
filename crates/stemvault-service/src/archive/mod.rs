//! Archive engines: extraction of uploads, assembly of subtrees.

pub mod assemble;
pub mod extract;
