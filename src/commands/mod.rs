pub mod read_limits; // Fetch and decode the storage-control block
pub mod set_limits;  // Apply a requested limit/enforcement change
