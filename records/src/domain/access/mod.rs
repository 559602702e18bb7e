pub mod errors;
pub mod gate;
pub mod principal;
pub mod tokens;

pub use errors::AccessError;
pub use gate::AuthenticationGate;
pub use principal::AuthenticatedPrincipal;
pub use principal::RequestContext;
pub use tokens::TokenService;
