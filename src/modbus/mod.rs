pub mod client;    // Request/response sequencing per operation
pub mod frame;     // Modbus-TCP frame encoding and decoding
pub mod transport; // Blocking socket transport
