//! Holds a profile, a reader and build options for repeated builds.

use crate::pipeline::{BuildOptions, BuildResult, ConfigPipeline};
use crate::profile::SpecProfile;
use crate::reader::ConfigReader;

/// Each call runs a fresh pipeline; nothing is cached between builds.
pub struct ConfigLoader<D, F> {
    profile: SpecProfile<D, F>,
    reader: Box<dyn ConfigReader>,
    options: BuildOptions,
}

impl<D, F> ConfigLoader<D, F> {
    pub fn new<R>(profile: SpecProfile<D, F>, reader: R, options: BuildOptions) -> Self
    where
        R: ConfigReader + 'static,
    {
        Self {
            profile,
            reader: Box::new(reader),
            options,
        }
    }

    pub fn profile(&self) -> &SpecProfile<D, F> {
        &self.profile
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build(&self) -> BuildResult<F> {
        ConfigPipeline::build(&self.profile, self.reader.as_ref(), &self.options)
    }

    /// Clear recorded provenance, then build again.
    pub fn reload(&self) -> BuildResult<F> {
        if let Some(reporter) = &self.options.provenance_reporter {
            reporter.reset();
        }
        self.build()
    }

    /// Swap in a new reader, e.g. after the backing file changed, and return the old one.
    pub fn replace_reader<R>(&mut self, reader: R) -> Box<dyn ConfigReader>
    where
        R: ConfigReader + 'static,
    {
        std::mem::replace(&mut self.reader, Box::new(reader))
    }
}

impl<D, F> std::fmt::Debug for ConfigLoader<D, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("profile", &self.profile)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
