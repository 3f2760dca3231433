//! # Provider and Course Registries
//!
//! Providers are registered by whoever calls first with an unused id; that
//! caller becomes the provider authority. Courses can only be created by
//! the provider authority, and the creator becomes the course authority.
//! Neither record can be updated afterwards.

use apec_core::{Address, CourseId, ProviderId, RecordKey, Timestamp};
use apec_state::{Course, Provider, Record};

use crate::error::ProgramError;
use crate::issuer::TokenIssuer;
use crate::program::CertProgram;
use crate::store::RecordStore;
use crate::telemetry;

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Register provider `id` with `caller` as its authority.
    pub fn init_provider(
        &self,
        caller: &Address,
        id: ProviderId,
        short_name: &str,
    ) -> Result<RecordKey, ProgramError> {
        let result = self.try_init_provider(caller, id, short_name);
        telemetry::observe("init_provider", &result);
        result
    }

    fn try_init_provider(
        &self,
        caller: &Address,
        id: ProviderId,
        short_name: &str,
    ) -> Result<RecordKey, ProgramError> {
        Self::check_name(
            "provider short_name",
            short_name,
            self.config.provider_name_max_len,
        )?;

        let key = RecordKey::provider(id);
        tracing::debug!(%key, %id, "derived provider key");

        let provider = Provider {
            id,
            short_name: short_name.to_string(),
            authority: *caller,
            created_at: Timestamp::now(),
        };
        self.store
            .create_with(key, || Ok::<_, ProgramError>(Record::from(provider)))
            .map_err(|e| ProgramError::from_create(e, ProgramError::DuplicateProvider))?;

        tracing::info!(%key, %id, authority = %caller, "provider registered");
        Ok(key)
    }

    /// Create course `id` under the provider at `provider_key`.
    ///
    /// Only the provider authority may call this.
    pub fn create_course(
        &self,
        caller: &Address,
        provider_key: &RecordKey,
        id: CourseId,
        short_name: &str,
    ) -> Result<RecordKey, ProgramError> {
        let result = self.try_create_course(caller, provider_key, id, short_name);
        telemetry::observe("create_course", &result);
        result
    }

    fn try_create_course(
        &self,
        caller: &Address,
        provider_key: &RecordKey,
        id: CourseId,
        short_name: &str,
    ) -> Result<RecordKey, ProgramError> {
        Self::check_name(
            "course short_name",
            short_name,
            self.config.course_name_max_len,
        )?;

        let provider = self.provider(provider_key)?;
        if provider.authority != *caller {
            return Err(ProgramError::Unauthorized {
                caller: *caller,
                action: "create a course",
            });
        }

        let key = RecordKey::course(provider_key, id);
        tracing::debug!(%key, provider = %provider_key, %id, "derived course key");

        let course = Course {
            id,
            short_name: short_name.to_string(),
            provider: *provider_key,
            authority: *caller,
            created_at: Timestamp::now(),
        };
        self.store
            .create_with(key, || Ok::<_, ProgramError>(Record::from(course)))
            .map_err(|e| ProgramError::from_create(e, ProgramError::DuplicateCourse))?;

        tracing::info!(%key, provider = %provider_key, %id, "course created");
        Ok(key)
    }
}
