// Stable error codes attached to API error responses

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_INVALID: &str = "AUTH_2002";
    pub const TOKEN_MISSING: &str = "AUTH_2003";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
}

pub mod resource {
    pub const NOT_FOUND: &str = "RESOURCE_5001";
    pub const CONFLICT: &str = "RESOURCE_5002";
}

pub mod system {
    pub const INTERNAL: &str = "SYSTEM_9001";
    pub const STORAGE_UNAVAILABLE: &str = "SYSTEM_9002";
}
