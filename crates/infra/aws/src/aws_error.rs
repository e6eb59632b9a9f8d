use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use decommission_core::error::ProviderError;

pub fn map_aws_error<E, R>(operation_name: &'static str, sdk_error: SdkError<E, R>) -> ProviderError
where
    E: std::error::Error + Send + Sync + 'static + ProvideErrorMetadata,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match sdk_error {
        SdkError::ServiceError(service_error) => {
            let error = service_error.into_err();
            classify_service_error(
                operation_name,
                error.code().unwrap_or_default(),
                error.message().unwrap_or_default(),
            )
        }

        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ProviderError::Transient {
            operation_name,
            source: Box::new(sdk_error),
        },

        other => ProviderError::Unknown {
            operation_name,
            detail: other.to_string(),
        },
    }
}

fn classify_service_error(operation_name: &'static str, code: &str, message: &str) -> ProviderError {
    match code {
        "AuthFailure" | "InvalidClientTokenId" | "SignatureDoesNotMatch" => {
            ProviderError::Authentication
        }
        "UnauthorizedOperation" | "AccessDenied" | "AccessDeniedException" => {
            ProviderError::Authorization {
                operation: operation_name.to_string(),
            }
        }
        "Throttling" | "ThrottlingException" | "RequestLimitExceeded" => ProviderError::Quota,
        _ => ProviderError::Unknown {
            operation_name,
            detail: format!("{code}: {message}"),
        },
    }
}
