/// Authentication utilities
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: HS256 access/refresh token generation and validation
/// - [`middleware`]: bearer token extraction and the per-request `AuthContext`
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, TokenType::Access), "secret")?;
/// assert_eq!(validate_access_token(&token, "secret")?.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
