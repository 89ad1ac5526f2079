//! Constants used throughout the connector.
//!
//! CDR endpoint paths, header and JSON field names, and the environment variable names the
//! binary reads configuration from.

/// Path of the AQL query endpoint, relative to the CDR base URL.
pub const QUERY_PATH: &str = "/rest/v1/query";

/// Path of the session endpoint, relative to the CDR base URL.
pub const SESSION_PATH: &str = "/rest/v1/session";

/// Header carrying the session token in token-auth mode.
pub const EHR_SESSION_HEADER: &str = "Ehr-Session";

/// Query response field holding the result set.
pub const RESULT_SET_FIELD: &str = "resultSet";

/// Session-open response field holding the token.
pub const SESSION_ID_FIELD: &str = "sessionId";

/// Session-close response field describing the action taken.
pub const SESSION_ACTION_FIELD: &str = "action";

/// Expected `action` after a successful session close.
pub const SESSION_DELETED_ACTION: &str = "DELETE";

/// Environment variable holding the CDR base URL.
pub const ENV_URL: &str = "CDR_CONNECTOR_URL";

/// Environment variable holding the CDR username.
pub const ENV_USERNAME: &str = "CDR_CONNECTOR_USERNAME";

/// Environment variable holding the CDR password.
pub const ENV_PASSWORD: &str = "CDR_CONNECTOR_PASSWORD";

/// Environment variable selecting token (session) authentication.
pub const ENV_IS_TOKEN_AUTH: &str = "CDR_CONNECTOR_IS_TOKEN_AUTH";
