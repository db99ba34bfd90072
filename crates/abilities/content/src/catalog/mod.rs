//! In-memory registry of linked content.
//!
//! Content is added bottom-up: effects first, then abilities (which resolve
//! their effect names), then sets (which resolve ability tags), then agent
//! templates (which resolve set names). Every reference is checked when the
//! referring item is added, so a fully built catalog has no dangling names.

mod specs;

pub use specs::{AbilitySetSpec, AbilitySpec, AgentTemplate, FollowUpSpec, GrantSpec};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use abilities_core::{
    AbilityDef, AbilitySet, AgentSetup, AttributeError, EffectError, EffectSpec, ErrorSeverity,
    FollowUpEffect, GameError, Tag,
};

/// Broken or conflicting content.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("effect '{0}' is defined twice")]
    DuplicateEffect(String),

    #[error("effect '{name}' is invalid: {source}")]
    InvalidEffect { name: String, source: EffectError },

    #[error("ability '{ability}' references unknown effect '{effect}'")]
    UnknownEffect { ability: Tag, effect: String },

    #[error("ability '{0}' is defined twice")]
    DuplicateAbility(Tag),

    #[error("set '{set}' references unknown ability '{ability}'")]
    UnknownAbility { set: String, ability: Tag },

    #[error("ability set '{0}' is defined twice")]
    DuplicateSet(String),

    #[error("template '{template}' references unknown ability set '{set}'")]
    UnknownSet { template: String, set: String },

    #[error("agent template '{0}' is defined twice")]
    DuplicateTemplate(String),

    #[error("agent template '{template}' is invalid: {source}")]
    InvalidTemplate {
        template: String,
        source: AttributeError,
    },

    #[error("agent template '{0}' not found")]
    UnknownTemplate(String),
}

impl GameError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            CatalogError::DuplicateEffect(_) => "CATALOG_DUPLICATE_EFFECT",
            CatalogError::InvalidEffect { .. } => "CATALOG_INVALID_EFFECT",
            CatalogError::UnknownEffect { .. } => "CATALOG_UNKNOWN_EFFECT",
            CatalogError::DuplicateAbility(_) => "CATALOG_DUPLICATE_ABILITY",
            CatalogError::UnknownAbility { .. } => "CATALOG_UNKNOWN_ABILITY",
            CatalogError::DuplicateSet(_) => "CATALOG_DUPLICATE_SET",
            CatalogError::UnknownSet { .. } => "CATALOG_UNKNOWN_SET",
            CatalogError::DuplicateTemplate(_) => "CATALOG_DUPLICATE_TEMPLATE",
            CatalogError::InvalidTemplate { .. } => "CATALOG_INVALID_TEMPLATE",
            CatalogError::UnknownTemplate(_) => "CATALOG_UNKNOWN_TEMPLATE",
        }
    }
}

/// Linked effects, abilities, ability sets and agent templates.
#[derive(Clone, Debug, Default)]
pub struct ContentCatalog {
    effects: BTreeMap<String, Arc<EffectSpec>>,
    abilities: BTreeMap<Tag, Arc<AbilityDef>>,
    sets: HashMap<String, AbilitySet>,
    templates: HashMap<String, AgentTemplate>,
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_effect(&mut self, spec: EffectSpec) -> Result<Arc<EffectSpec>, CatalogError> {
        spec.validate().map_err(|source| CatalogError::InvalidEffect {
            name: spec.name.clone(),
            source,
        })?;
        if self.effects.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateEffect(spec.name));
        }
        let spec = Arc::new(spec);
        self.effects.insert(spec.name.clone(), Arc::clone(&spec));
        Ok(spec)
    }

    pub fn add_effects(
        &mut self,
        specs: impl IntoIterator<Item = EffectSpec>,
    ) -> Result<usize, CatalogError> {
        let mut added = 0;
        for spec in specs {
            self.add_effect(spec)?;
            added += 1;
        }
        Ok(added)
    }

    /// Links an ability spec against the registered effects.
    pub fn add_ability(&mut self, spec: &AbilitySpec) -> Result<Arc<AbilityDef>, CatalogError> {
        if self.abilities.contains_key(&spec.tag) {
            return Err(CatalogError::DuplicateAbility(spec.tag.clone()));
        }
        let effect = |name: &str| {
            self.effect(name).ok_or_else(|| CatalogError::UnknownEffect {
                ability: spec.tag.clone(),
                effect: name.to_string(),
            })
        };
        let optional = |name: &Option<String>| name.as_deref().map(&effect).transpose();
        let follow_ups = |specs: &[FollowUpSpec]| {
            specs
                .iter()
                .map(|follow_up| {
                    Ok(FollowUpEffect::new(effect(follow_up.effect.as_str())?, follow_up.target))
                })
                .collect::<Result<Vec<_>, CatalogError>>()
        };

        let def = AbilityDef {
            tag: spec.tag.clone(),
            activation_effect: optional(&spec.activation)?,
            cooldown_effect: optional(&spec.cooldown)?,
            cost_effect: optional(&spec.cost)?,
            owned_tags: spec.owned_tags.clone(),
            activation_tags: spec.activation_tags.clone(),
            blocked_by: spec.blocked_by.clone(),
            confirm: spec.confirm,
            input: spec.input,
            on_period: follow_ups(&spec.on_period)?,
            on_finish: follow_ups(&spec.on_finish)?,
            montage: spec.montage.clone(),
        };
        let def = Arc::new(def);
        self.abilities.insert(spec.tag.clone(), Arc::clone(&def));
        Ok(def)
    }

    pub fn add_set(&mut self, spec: &AbilitySetSpec) -> Result<&AbilitySet, CatalogError> {
        if self.sets.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateSet(spec.name.clone()));
        }
        let mut set = AbilitySet::new(spec.name.clone());
        for grant in &spec.abilities {
            let ability = self
                .ability(&grant.ability)
                .ok_or_else(|| CatalogError::UnknownAbility {
                    set: spec.name.clone(),
                    ability: grant.ability.clone(),
                })?;
            set = set.with(ability, grant.input.clone());
        }
        Ok(self.sets.entry(spec.name.clone()).or_insert(set))
    }

    pub fn add_template(&mut self, template: AgentTemplate) -> Result<(), CatalogError> {
        if self.templates.contains_key(&template.name) {
            return Err(CatalogError::DuplicateTemplate(template.name));
        }
        for def in &template.attributes {
            def.validate().map_err(|source| CatalogError::InvalidTemplate {
                template: template.name.clone(),
                source,
            })?;
        }
        if let Some(missing) = template
            .ability_sets
            .iter()
            .find(|set| !self.sets.contains_key(set.as_str()))
        {
            return Err(CatalogError::UnknownSet {
                template: template.name.clone(),
                set: missing.clone(),
            });
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn effect(&self, name: &str) -> Option<Arc<EffectSpec>> {
        self.effects.get(name).cloned()
    }

    pub fn ability(&self, tag: &Tag) -> Option<Arc<AbilityDef>> {
        self.abilities.get(tag).cloned()
    }

    pub fn set(&self, name: &str) -> Option<&AbilitySet> {
        self.sets.get(name)
    }

    pub fn template(&self, name: &str) -> Option<&AgentTemplate> {
        self.templates.get(name)
    }

    /// Spawn parameters for an agent built from the named template.
    pub fn agent_setup(&self, template: &str) -> Result<AgentSetup, CatalogError> {
        let template = self
            .template(template)
            .ok_or_else(|| CatalogError::UnknownTemplate(template.to_string()))?;
        let mut setup = AgentSetup::new();
        for def in &template.attributes {
            setup = setup.with_attribute_def(def.clone());
        }
        for tag in template.tags.iter() {
            setup = setup.with_tag(tag.clone());
        }
        for name in &template.ability_sets {
            let set = self.set(name).ok_or_else(|| CatalogError::UnknownSet {
                template: template.name.clone(),
                set: name.clone(),
            })?;
            setup = setup.with_set(set);
        }
        Ok(setup)
    }

    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn ability_tags(&self) -> impl Iterator<Item = &Tag> {
        self.abilities.keys()
    }

    /// Template names, sorted.
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abilities_core::{AttributeDef, ModOp};

    fn catalog() -> ContentCatalog {
        let mut catalog = ContentCatalog::new();
        catalog
            .add_effects([
                EffectSpec::lasting("Bolt.Cast", 0.5),
                EffectSpec::instant("Bolt.Hit").with_modifier("Health", ModOp::Add, -10.0),
            ])
            .unwrap();
        let mut bolt = AbilitySpec::new("Ability.Bolt");
        bolt.activation = Some("Bolt.Cast".into());
        bolt.on_finish.push(FollowUpSpec {
            effect: "Bolt.Hit".into(),
            target: abilities_core::FollowUpTarget::Confirmed,
        });
        catalog.add_ability(&bolt).unwrap();
        catalog
    }

    #[test]
    fn abilities_link_their_effects() {
        let catalog = catalog();
        let bolt = catalog.ability(&"Ability.Bolt".into()).unwrap();
        let cast = catalog.effect("Bolt.Cast").unwrap();
        assert!(Arc::ptr_eq(bolt.activation_effect.as_ref().unwrap(), &cast));
        assert_eq!(bolt.on_finish.len(), 1);
        assert_eq!(bolt.activation_seconds(), 0.5);
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut catalog = catalog();
        let mut broken = AbilitySpec::new("Ability.Broken");
        broken.cooldown = Some("Missing".into());
        assert_eq!(
            catalog.add_ability(&broken).unwrap_err(),
            CatalogError::UnknownEffect {
                ability: "Ability.Broken".into(),
                effect: "Missing".into()
            }
        );

        let set = AbilitySetSpec {
            name: "caster".into(),
            abilities: vec![GrantSpec {
                ability: "Ability.Missing".into(),
                input: None,
            }],
        };
        assert!(matches!(
            catalog.add_set(&set),
            Err(CatalogError::UnknownAbility { .. })
        ));

        let template = AgentTemplate {
            name: "mage".into(),
            attributes: Vec::new(),
            tags: Default::default(),
            ability_sets: vec!["caster".into()],
        };
        assert!(matches!(
            catalog.add_template(template),
            Err(CatalogError::UnknownSet { .. })
        ));
    }

    #[test]
    fn duplicates_and_invalid_effects_are_rejected() {
        let mut catalog = catalog();
        assert_eq!(
            catalog.add_effect(EffectSpec::lasting("Bolt.Cast", 1.0)).unwrap_err(),
            CatalogError::DuplicateEffect("Bolt.Cast".into())
        );
        let error = catalog
            .add_effect(EffectSpec::periodic("Bad", 1.0, 0.0))
            .unwrap_err();
        assert_eq!(error.error_code(), "CATALOG_INVALID_EFFECT");
        assert!(catalog.add_ability(&AbilitySpec::new("Ability.Bolt")).is_err());
    }

    #[test]
    fn templates_expand_into_agent_setups() {
        let mut catalog = catalog();
        catalog
            .add_set(&AbilitySetSpec {
                name: "caster".into(),
                abilities: vec![GrantSpec {
                    ability: "Ability.Bolt".into(),
                    input: Some("Input.Primary".into()),
                }],
            })
            .unwrap();
        catalog
            .add_template(AgentTemplate {
                name: "mage".into(),
                attributes: vec![AttributeDef::new("Health", 80.0)],
                tags: ["Faction.Player"].into_iter().collect(),
                ability_sets: vec!["caster".into()],
            })
            .unwrap();

        let setup = catalog.agent_setup("mage").unwrap();
        assert_eq!(setup.attributes.len(), 1);
        assert_eq!(setup.abilities.len(), 1);
        assert_eq!(setup.abilities[0].1, Some("Input.Primary".into()));
        assert!(setup.tags.has_tag(&"Faction.Player".into()));
        assert!(matches!(
            catalog.agent_setup("golem"),
            Err(CatalogError::UnknownTemplate(_))
        ));
    }
}
