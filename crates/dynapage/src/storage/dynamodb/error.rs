//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `dynapage_core`, classifying them
//! by the service's structured error code.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use dynapage_core::{ErrorKind, StoreError};

/// Error code DynamoDB reports when a request exceeds provisioned throughput.
pub const CAPACITY_EXCEEDED_CODE: &str = "ProvisionedThroughputExceededException";

/// Code used for failures that never reached the service.
const NETWORK_ERROR_CODE: &str = "NetworkError";

/// Code used when the service response carried no error code.
const UNKNOWN_ERROR_CODE: &str = "Unknown";

/// Classify a DynamoDB error code.
pub fn classify_code(code: &str) -> ErrorKind {
    match code {
        CAPACITY_EXCEEDED_CODE => ErrorKind::CapacityExceeded,
        "ValidationException" | "SerializationException" => ErrorKind::Validation,
        "AccessDeniedException"
        | "UnrecognizedClientException"
        | "MissingAuthenticationTokenException"
        | "InvalidSignatureException"
        | "ExpiredTokenException" => ErrorKind::AccessDenied,
        "ResourceNotFoundException" => ErrorKind::NotFound,
        "ConditionalCheckFailedException" => ErrorKind::ConditionFailed,
        _ => ErrorKind::Other,
    }
}

/// Map any SDK operation error to a classified `StoreError`.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let context = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StoreError::new(ErrorKind::Network, NETWORK_ERROR_CODE, context)
        }
        _ => {
            let code = err.code().unwrap_or(UNKNOWN_ERROR_CODE);
            let message = err.message().map(str::to_string).unwrap_or(context);
            StoreError::new(classify_code(code), code, message)
        }
    }
}
