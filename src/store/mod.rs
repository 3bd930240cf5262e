pub mod memory;

pub use memory::MemoryCryptoRepo;
