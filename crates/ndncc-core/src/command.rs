//! Control command construction.
//!
//! A command names its target as
//! `/localhost/nfd/<module>/<verb>/<ControlParameters>`, where the last
//! component is the encoded parameter set as one opaque generic component.
//! [`ControlCommand::finalize`] appends the signed-command components and
//! wraps the result in an Interest.
//!
//! Building is permissive: any parameter set is accepted. The verb table in
//! [`required_fields`] is checked only when a caller asks for it through
//! [`ControlCommand::validate`].

use std::time::Duration;

use ndncc_proto::{ControlParameters, Interest, Name, ParameterField};

use crate::{env::Environment, error::EncodingError, signer::CommandStamper};

/// First two components of every management command.
pub const MANAGEMENT_PREFIX: [&str; 2] = ["localhost", "nfd"];

/// Fields a management verb cannot do without.
///
/// Unknown verbs require nothing.
pub fn required_fields(module: &str, verb: &str) -> &'static [ParameterField] {
    use ParameterField::{FaceId, Name, Strategy, Uri};

    match (module, verb) {
        ("faces", "create") => &[Uri],
        ("faces", "destroy") => &[FaceId],
        ("rib", "register" | "unregister")
        | ("fib", "add-nexthop" | "remove-nexthop")
        | ("strategy-choice", "unset")
        | ("cs", "erase") => &[Name],
        ("strategy-choice", "set") => &[Name, Strategy],
        _ => &[],
    }
}

/// One management command before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    /// Management module, e.g. `faces`.
    pub module: String,
    /// Command verb, e.g. `create`.
    pub verb: String,
    /// Parameters carried in the name.
    pub parameters: ControlParameters,
}

impl ControlCommand {
    /// Command for `module`/`verb` with `parameters`.
    pub fn new(
        module: impl Into<String>,
        verb: impl Into<String>,
        parameters: ControlParameters,
    ) -> Self {
        Self { module: module.into(), verb: verb.into(), parameters }
    }

    /// `/localhost/nfd/<module>/<verb>/<parameters>` without signature
    /// components.
    pub fn name(&self) -> Name {
        let mut name = Name::new();
        for component in MANAGEMENT_PREFIX {
            name = name.append_generic(component.as_bytes().to_vec());
        }
        name.append_generic(self.module.as_bytes().to_vec())
            .append_generic(self.verb.as_bytes().to_vec())
            .append_generic(self.parameters.encode())
    }

    /// Check the parameters against [`required_fields`].
    ///
    /// # Errors
    ///
    /// `EncodingError::MissingField` naming the first absent field.
    pub fn validate(&self) -> Result<(), EncodingError> {
        match required_fields(&self.module, &self.verb)
            .iter()
            .find(|field| !self.parameters.contains(**field))
        {
            Some(&field) => Err(EncodingError::MissingField {
                module: self.module.clone(),
                verb: self.verb.clone(),
                field,
            }),
            None => Ok(()),
        }
    }

    /// Signed command Interest.
    ///
    /// The forwarder answers under the signed name, so the Interest allows
    /// prefix matching.
    pub fn finalize<E: Environment>(
        &self,
        stamper: &CommandStamper,
        env: &E,
        lifetime: Duration,
    ) -> Interest {
        let signed = stamper.stamp(self.name(), env);
        Interest::new(signed).with_can_be_prefix(true).with_lifetime(lifetime)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use std::{future::Future, time::Instant};

    use ndncc_proto::tlv::{Element, types};
    use proptest::prelude::*;

    use super::*;
    use crate::signer::DigestSigner;

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        fn now(&self) -> Instant {
            Instant::now()
        }

        fn unix_millis(&self) -> u64 {
            1_000
        }

        fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
            async {}
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0);
        }
    }

    fn register_params() -> ControlParameters {
        ControlParameters {
            name: Some("/ndn".parse().unwrap()),
            face_id: Some(300),
            origin: Some(66),
            cost: Some(100),
            ..ControlParameters::default()
        }
    }

    #[test]
    fn command_name_layout() {
        let command = ControlCommand::new("rib", "register", register_params());
        let name = command.name();

        assert_eq!(name.len(), 5);
        assert!("/localhost/nfd/rib/register".parse::<Name>().unwrap().is_prefix_of(&name));

        let blob = name.last().unwrap().value();
        Element::read_exact(blob, types::CONTROL_PARAMETERS).unwrap();
        assert_eq!(ControlParameters::decode(blob).unwrap(), register_params());
    }

    #[test]
    fn finalize_signs_and_sets_selectors() {
        let command = ControlCommand::new("faces", "destroy", ControlParameters {
            face_id: Some(7),
            ..ControlParameters::default()
        });
        let stamper = CommandStamper::new(DigestSigner);

        let interest = command.finalize(&stamper, &TestEnv, Duration::from_secs(4));
        assert_eq!(interest.name.len(), command.name().len() + 4);
        assert!(command.name().is_prefix_of(&interest.name));
        assert!(interest.can_be_prefix);
        assert!(!interest.must_be_fresh);
        assert_eq!(interest.lifetime, Duration::from_secs(4));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let command = ControlCommand::new("strategy-choice", "set", ControlParameters {
            name: Some("/ndn".parse().unwrap()),
            ..ControlParameters::default()
        });

        let err = command.validate().unwrap_err();
        assert!(matches!(
            err,
            EncodingError::MissingField { field: ParameterField::Strategy, .. }
        ));
    }

    #[test]
    fn validate_accepts_complete_and_unknown_commands() {
        assert!(ControlCommand::new("rib", "register", register_params()).validate().is_ok());
        assert!(ControlCommand::new("status", "general", ControlParameters::new())
            .validate()
            .is_ok());
    }

    #[test]
    fn builder_is_permissive() {
        // An incomplete command still builds; only validate() objects.
        let command = ControlCommand::new("faces", "create", ControlParameters::new());
        assert_eq!(command.name().len(), 5);
        assert!(command.validate().is_err());
    }

    proptest! {
        #[test]
        fn parameter_blob_round_trips(
            face_id in proptest::option::of(any::<u64>()),
            cost in proptest::option::of(any::<u64>()),
            uri in proptest::option::of("[a-z0-9]{1,8}://[a-z0-9.]{1,16}"),
        ) {
            let parameters = ControlParameters { face_id, cost, uri, ..ControlParameters::default() };
            let command = ControlCommand::new("faces", "update", parameters.clone());

            let blob = command.name().last().unwrap().value().to_vec();
            prop_assert_eq!(ControlParameters::decode(&blob).unwrap(), parameters);
        }
    }
}
