//! Human-readable rendering of runtime dispatch errors.

use itertools::Itertools;

use crate::chain::{ArithmeticError, DispatchError, ErrorMetadata, TokenError};

impl TokenError {
    pub fn name(&self) -> &'static str {
        match self {
            TokenError::FundsUnavailable => "FundsUnavailable",
            TokenError::OnlyProvider => "OnlyProvider",
            TokenError::BelowMinimum => "BelowMinimum",
            TokenError::CannotCreate => "CannotCreate",
            TokenError::UnknownAsset => "UnknownAsset",
            TokenError::Frozen => "Frozen",
            TokenError::Unsupported => "Unsupported",
            TokenError::CannotCreateHold => "CannotCreateHold",
            TokenError::NotExpendable => "NotExpendable",
            TokenError::Blocked => "Blocked",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TokenError::FundsUnavailable => "Funds are unavailable.",
            TokenError::OnlyProvider => {
                "Some part of the balance gives the only provider reference to the account and \
                 thus cannot be (re)moved."
            }
            TokenError::BelowMinimum => "Account cannot exist with the funds that would be given.",
            TokenError::CannotCreate => "Account cannot be created.",
            TokenError::UnknownAsset => "The asset in question is unknown.",
            TokenError::Frozen => "Funds exist but are frozen.",
            TokenError::Unsupported => "Operation is not supported by the asset.",
            TokenError::CannotCreateHold => {
                "Account cannot be created for recording amount on hold."
            }
            TokenError::NotExpendable => "Account that is desired to remain would die.",
            TokenError::Blocked => "Account cannot receive the assets.",
        }
    }
}

impl ArithmeticError {
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticError::Underflow => "Underflow",
            ArithmeticError::Overflow => "Overflow",
            ArithmeticError::DivisionByZero => "DivisionByZero",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ArithmeticError::Underflow => "An underflow would occur.",
            ArithmeticError::Overflow => "An overflow would occur.",
            ArithmeticError::DivisionByZero => "Division by zero.",
        }
    }
}

/// Renders `error` for humans.
///
/// Pallet errors are looked up in the runtime metadata and rendered as
/// `<section>.<name>: <docs>`; token and arithmetic errors use their typed
/// description; anything else falls back to its raw form.
pub fn decode_dispatch_error<M>(metadata: &M, error: &DispatchError) -> String
where
    M: ErrorMetadata + ?Sized,
{
    match error {
        DispatchError::Module(module) => match metadata.module_error(module) {
            Some(details) => format!(
                "{}.{}: {}",
                details.section,
                details.name,
                details.docs.iter().map(|line| line.trim()).join(" ")
            ),
            None => format!(
                "Module error: pallet {} error 0x{}",
                module.index,
                hex::encode(module.error)
            ),
        },
        DispatchError::Token(token) => {
            format!("TokenError.{}: {}", token.name(), token.description())
        }
        DispatchError::Arithmetic(arithmetic) => format!(
            "ArithmeticError.{}: {}",
            arithmetic.name(),
            arithmetic.description()
        ),
        DispatchError::Other(raw) => raw.clone(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ErrorDetails, MockErrorMetadata, ModuleError};

    #[test]
    fn module_error_uses_metadata() {
        let mut metadata = MockErrorMetadata::new();
        metadata
            .expect_module_error()
            .withf(|error| error.index == 52 && error.error == [3, 0, 0, 0])
            .times(1)
            .return_const(Some(ErrorDetails {
                section: "settlementGroth16Pallet".into(),
                name: "VerifyError".into(),
                docs: vec!["Provided data has not valid public inputs.".into()],
            }));

        let error = DispatchError::Module(ModuleError {
            index: 52,
            error: [3, 0, 0, 0],
        });
        assert_eq!(
            decode_dispatch_error(&metadata, &error),
            "settlementGroth16Pallet.VerifyError: Provided data has not valid public inputs."
        );
    }

    #[test]
    fn multi_line_docs_are_joined() {
        let mut metadata = MockErrorMetadata::new();
        metadata.expect_module_error().return_const(Some(ErrorDetails {
            section: "balances".into(),
            name: "InsufficientBalance".into(),
            docs: vec![" Balance too low ".into(), "to send value.".into()],
        }));
        let error = DispatchError::Module(ModuleError {
            index: 6,
            error: [2, 0, 0, 0],
        });
        assert_eq!(
            decode_dispatch_error(&metadata, &error),
            "balances.InsufficientBalance: Balance too low to send value."
        );
    }

    #[test]
    fn unknown_module_error_is_raw() {
        let mut metadata = MockErrorMetadata::new();
        metadata
            .expect_module_error()
            .return_const(None::<ErrorDetails>);
        let error = DispatchError::Module(ModuleError {
            index: 9,
            error: [1, 2, 0, 0],
        });
        assert_eq!(
            decode_dispatch_error(&metadata, &error),
            "Module error: pallet 9 error 0x01020000"
        );
    }

    #[test]
    fn typed_errors_do_not_touch_metadata() {
        let metadata = MockErrorMetadata::new();
        assert_eq!(
            decode_dispatch_error(&metadata, &DispatchError::Token(TokenError::FundsUnavailable)),
            "TokenError.FundsUnavailable: Funds are unavailable."
        );
        assert_eq!(
            decode_dispatch_error(
                &metadata,
                &DispatchError::Arithmetic(ArithmeticError::Overflow)
            ),
            "ArithmeticError.Overflow: An overflow would occur."
        );
        assert_eq!(
            decode_dispatch_error(&metadata, &DispatchError::BadOrigin),
            "BadOrigin"
        );
        assert_eq!(
            decode_dispatch_error(&metadata, &DispatchError::Other("custom".into())),
            "custom"
        );
    }
}
