//! Pet demo profile and its context provider.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local, Timelike, Utc};
use serde::Serialize;
use specconfig_core::{
    decode, required, Binding, ContextProvider, ContextualSpecEntry, DecisionBinding,
    DecisionEntry, EvaluationContext, SpecEntry, SpecProfile,
};

pub const PET_NAME: &str = "pet.name";
pub const PET_IS_SLEEPING: &str = "pet.isSleeping";

#[derive(Debug, Default)]
pub struct PetDraft {
    pub name: Option<String>,
    pub is_sleeping: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PetConfig {
    pub pet_name: String,
    pub is_sleeping: bool,
}

/// Name and sleep state; a sleeping pet with no name is called "Sleepy".
pub fn profile() -> SpecProfile<PetDraft, PetConfig> {
    SpecProfile::new(|draft: PetDraft| {
        Ok(PetConfig {
            pet_name: required(draft.name, PET_NAME)?,
            is_sleeping: required(draft.is_sleeping, PET_IS_SLEEPING)?,
        })
    })
    .binding(
        Binding::new(PET_NAME, |d: &mut PetDraft| &mut d.name, decode::string).with_spec(
            SpecEntry::predicate("Pet name must not be blank", |name: &String| {
                !name.trim().is_empty()
            }),
        ),
    )
    .binding(
        Binding::new(PET_IS_SLEEPING, |d: &mut PetDraft| &mut d.is_sleeping, decode::bool)
            .with_default(false)
            .with_contextual_spec(ContextualSpecEntry::new(
                "Pets sleep at night",
                |ctx: &EvaluationContext, sleeping: &bool| {
                    !*sleeping || ctx.flag("nightTime") || ctx.flag("sleepOverride")
                },
            )),
    )
    .decision(
        DecisionBinding::new(PET_NAME, |d: &mut PetDraft| &mut d.name).with_decision(
            DecisionEntry::when(
                "Sleeping pet",
                |d: &PetDraft| d.is_sleeping == Some(true),
                "Sleepy".to_string(),
            ),
        ),
    )
}

type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Night-time context for the pet profile.
///
/// Night is 19:00 to 06:00 local time unless an override is set.
pub struct DemoContextProvider {
    launch_date: DateTime<Utc>,
    reload_count: AtomicI64,
    night_override: Mutex<Option<bool>>,
    clock: Clock,
}

impl DemoContextProvider {
    pub fn new() -> Self {
        Self::with_clock(Local::now)
    }

    pub fn with_clock<C>(clock: C) -> Self
    where
        C: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        Self {
            launch_date: Utc::now(),
            reload_count: AtomicI64::new(0),
            night_override: Mutex::new(None),
            clock: Box::new(clock),
        }
    }

    pub fn record_reload(&self) {
        self.reload_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reload_count(&self) -> i64 {
        self.reload_count.load(Ordering::SeqCst)
    }

    pub fn set_night_override(&self, value: Option<bool>) {
        *self
            .night_override
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
    }

    fn night_override(&self) -> Option<bool> {
        *self
            .night_override
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_night(&self) -> bool {
        match self.night_override() {
            Some(forced) => forced,
            None => {
                let hour = (self.clock)().hour();
                !(6..19).contains(&hour)
            }
        }
    }

    pub fn summary(&self) -> String {
        let phase = if self.is_night() { "Nighttime" } else { "Daytime" };
        format!("{phase} · Reloads: {}", self.reload_count())
    }
}

impl Default for DemoContextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for DemoContextProvider {
    fn current_context(&self) -> EvaluationContext {
        EvaluationContext::default()
            .with_current_date((self.clock)().with_timezone(&Utc))
            .with_launch_date(self.launch_date)
            .with_counter("reloadCount", self.reload_count())
            .with_flag("nightTime", self.is_night())
            .with_flag("sleepOverride", self.night_override().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use specconfig_core::{BuildOptions, ConfigPipeline, InMemoryProvider};
    use std::sync::Arc;

    fn at_hour(hour: u32) -> DemoContextProvider {
        DemoContextProvider::with_clock(move || {
            Local
                .with_ymd_and_hms(2024, 6, 15, hour, 30, 0)
                .single()
                .expect("unambiguous local time")
        })
    }

    #[test]
    fn test_night_window() {
        assert!(at_hour(5).is_night());
        assert!(!at_hour(6).is_night());
        assert!(!at_hour(18).is_night());
        assert!(at_hour(19).is_night());
    }

    #[test]
    fn test_override_wins_over_clock() {
        let provider = at_hour(12);
        provider.set_night_override(Some(true));
        assert!(provider.is_night());
        assert!(provider.current_context().flag("sleepOverride"));

        provider.set_night_override(None);
        assert!(!provider.is_night());
        assert!(!provider.current_context().flag("sleepOverride"));
    }

    #[test]
    fn test_context_carries_reload_counter() {
        let provider = at_hour(12);
        provider.record_reload();
        provider.record_reload();
        assert_eq!(provider.current_context().counter("reloadCount"), 2);
        assert_eq!(provider.summary(), "Daytime · Reloads: 2");
    }

    #[test]
    fn test_sleeping_pet_without_name_is_sleepy_at_night() {
        let options = BuildOptions::new().with_context_provider(Arc::new(at_hour(23)));
        let reader = InMemoryProvider::new("memory").with(PET_IS_SLEEPING, true);

        let result = ConfigPipeline::build(&profile(), &reader, &options);
        assert_eq!(
            result.final_value(),
            Some(&PetConfig {
                pet_name: "Sleepy".to_string(),
                is_sleeping: true
            })
        );
        assert_eq!(result.snapshot().decision_traces().len(), 1);
    }

    #[test]
    fn test_sleeping_at_noon_fails_contextual_spec() {
        let options = BuildOptions::new().with_context_provider(Arc::new(at_hour(12)));
        let reader = InMemoryProvider::new("memory")
            .with(PET_NAME, "Rex")
            .with(PET_IS_SLEEPING, true);

        let result = ConfigPipeline::build(&profile(), &reader, &options);
        assert!(!result.is_success());
        let lines = result.diagnostics().formatted_lines();
        assert!(lines.iter().any(|l| l.contains("Pets sleep at night")));
    }

    #[test]
    fn test_awake_pet_needs_a_name() {
        let options = BuildOptions::new().with_context_provider(Arc::new(at_hour(12)));
        let reader = InMemoryProvider::new("memory");

        let result = ConfigPipeline::build(&profile(), &reader, &options);
        assert!(!result.is_success());
        assert_eq!(result.diagnostics().error_count(), 1);
    }
}
