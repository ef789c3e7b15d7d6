use crate::error::AppError;

/// bcrypt hashing with a fixed cost, loaded from configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Never fails: a stored hash bcrypt cannot parse counts as a mismatch.
    pub fn verify(&self, password: &str, hashed_password: &str) -> bool {
        match bcrypt::verify(password, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("Stored password hash could not be verified: {}", e);
                false
            }
        }
    }
}
