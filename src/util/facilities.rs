use crate::{
    database::{persistance::Persistance, store::KeyValueStore},
    enrichment::{DisabledEnricher, Enricher},
    errors::TrackerError,
    presentation::Presentation,
};

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum Required {
    Presentation,
    Store,
    Enricher,
}

/// The collaborators the core talks to. Owned by the session and lent to the
/// collection for the duration of one operation.
pub struct Facilities {
    presentation: Box<dyn Presentation>,
    persistance: Persistance,
    enricher: Box<dyn Enricher>,
}

impl Facilities {
    pub fn presentation(&mut self) -> &mut dyn Presentation {
        self.presentation.as_mut()
    }

    pub fn persistance(&self) -> &Persistance {
        &self.persistance
    }

    pub fn enricher(&self) -> &dyn Enricher {
        self.enricher.as_ref()
    }
}

pub struct DependenciesBuilder {
    required: Vec<Required>,
    presentation: Option<Box<dyn Presentation>>,
    store: Option<Box<dyn KeyValueStore>>,
    enricher: Option<Box<dyn Enricher>>,
}

impl Default for DependenciesBuilder {
    fn default() -> Self {
        DependenciesBuilder::new()
    }
}

impl DependenciesBuilder {
    pub fn new() -> Self {
        Self {
            required: vec![Required::Presentation, Required::Store],
            presentation: None,
            store: None,
            enricher: None,
        }
    }

    pub fn require(mut self, required: Required) -> Self {
        if !self.required.contains(&required) {
            self.required.push(required);
        }
        self
    }

    pub fn with_presentation(mut self, presentation: impl Presentation + 'static) -> Self {
        self.presentation = Some(Box::new(presentation));
        self
    }

    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enricher = Some(Box::new(enricher));
        self
    }

    /// Without an enricher (and unless one is required) lookups are switched off.
    pub fn build(self) -> Result<Facilities, TrackerError> {
        self.check()?;

        let presentation = self
            .presentation
            .ok_or(TrackerError::MissingFacility("presentation"))?;
        let store = self.store.ok_or(TrackerError::MissingFacility("store"))?;
        let enricher = self
            .enricher
            .unwrap_or_else(|| Box::new(DisabledEnricher) as Box<dyn Enricher>);

        Ok(Facilities {
            presentation,
            persistance: Persistance::new(store),
            enricher,
        })
    }

    fn check(&self) -> Result<(), TrackerError> {
        for required in &self.required {
            let missing = match required {
                Required::Presentation => self.presentation.is_none(),
                Required::Store => self.store.is_none(),
                Required::Enricher => self.enricher.is_none(),
            };

            if missing {
                return Err(TrackerError::MissingFacility(match required {
                    Required::Presentation => "presentation",
                    Required::Store => "store",
                    Required::Enricher => "enricher",
                }));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::store::MemoryStore, enrichment::RecordingEnricher,
        presentation::headless::HeadlessPresentation,
    };

    #[test]
    fn builds_with_disabled_enrichment_by_default() {
        let facilities = DependenciesBuilder::new()
            .with_presentation(HeadlessPresentation::new())
            .with_store(MemoryStore::new())
            .build();

        assert!(facilities.is_ok());
    }

    #[test]
    fn reports_the_missing_facility() {
        let result = DependenciesBuilder::new()
            .with_store(MemoryStore::new())
            .build();
        assert!(matches!(result, Err(TrackerError::MissingFacility("presentation"))));

        let result = DependenciesBuilder::new()
            .require(Required::Enricher)
            .with_presentation(HeadlessPresentation::new())
            .with_store(MemoryStore::new())
            .build();
        assert!(matches!(result, Err(TrackerError::MissingFacility("enricher"))));
    }

    #[test]
    fn required_enricher_is_satisfied() {
        let result = DependenciesBuilder::new()
            .require(Required::Enricher)
            .with_presentation(HeadlessPresentation::new())
            .with_store(MemoryStore::new())
            .with_enricher(RecordingEnricher::new())
            .build();

        assert!(result.is_ok());
    }
}
