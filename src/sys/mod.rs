// 🛡️ Each stage of the login lives in its own module; traits carry the wire types.

pub mod traits;     // Endpoint contract + login wire types
pub mod secrets;    // Memory hygiene (SecretToken)
pub mod bearer;     // Bearer token loading
pub mod consul;     // Consul HTTP client
pub mod exchange;   // Bearer token -> SecretID
pub mod sink;       // Token sink file
