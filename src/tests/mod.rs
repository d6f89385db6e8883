



// Value to text and back
pub mod codec;

// Building hosts from closures
pub mod registry;
