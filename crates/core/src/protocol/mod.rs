mod flow;
mod functions;
mod traits;
mod types;
mod validation;

pub use flow::{begin_login, complete_login};
pub use functions::{build_extension_args, identifier_scheme, strip_query, IdentifierScheme};
pub use traits::{AuthRequest, DiscoveryFailure, OpenIdConsumer};
pub use types::{
    ConsumerResponse, ConsumerStatus, ExtensionArg, Operation, ProtocolResult, SregRequest,
};
pub use validation::validate_next;
