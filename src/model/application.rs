//! Simulated applications.

use crate::parser::ApplicationDescription;
use crate::runtime::{Capability, ObjectHandle, Runtime};

use super::error::ModelBuildError;

/// An application owned by exactly one node. The type identifier from the
/// description is passed through to the runtime's type registry untouched.
#[derive(Debug)]
pub struct Application {
    name: String,
    object: ObjectHandle,
}

impl Application {
    pub fn create(
        runtime: &Runtime,
        description: &ApplicationDescription,
    ) -> Result<Self, ModelBuildError> {
        let object = runtime
            .create_with_capability(
                &description.type_name,
                &description.attributes,
                Capability::Application,
            )
            .map_err(|error| ModelBuildError::from_factory(&description.name, error))?;

        Ok(Self {
            name: description.name.clone(),
            object,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }
}
