pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtTokenIssuer, TokenType};
pub use middleware::{Actor, actor_middleware};
