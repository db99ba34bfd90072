//! Ability and ability set loaders.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{AbilitySetSpec, AbilitySpec};
use crate::loaders::{LoadResult, read_file};

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityCatalog {
    pub abilities: Vec<AbilitySpec>,
}

/// Ability set catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitySetCatalog {
    pub sets: Vec<AbilitySetSpec>,
}

/// Loader for ability specs from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilitySpec>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load abilities from {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilitySpec>> {
        let catalog: AbilityCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability catalog RON: {}", e))?;
        Ok(catalog.abilities)
    }
}

/// Loader for ability sets from RON files.
pub struct AbilitySetLoader;

impl AbilitySetLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilitySetSpec>> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load ability sets from {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilitySetSpec>> {
        let catalog: AbilitySetCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability set RON: {}", e))?;
        Ok(catalog.sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abilities_core::{ConfirmPolicy, FollowUpTarget, InputBehavior};

    #[test]
    fn ability_specs_reference_effects_by_name() {
        let abilities = AbilityLoader::parse(
            r#"(
                abilities: [
                    (
                        tag: "Ability.Bolt",
                        activation: Some("Bolt.Cast"),
                        confirm: WaitForConfirm,
                        on_finish: [(effect: "Bolt.Hit", target: Confirmed)],
                        montage: Some((name: "cast", length: 0.8)),
                    ),
                    (tag: "Ability.Wait"),
                ],
            )"#,
        )
        .unwrap();

        let bolt = &abilities[0];
        assert_eq!(bolt.activation.as_deref(), Some("Bolt.Cast"));
        assert_eq!(bolt.confirm, ConfirmPolicy::WaitForConfirm);
        assert_eq!(bolt.input, InputBehavior::OnPress);
        assert_eq!(bolt.on_finish[0].target, FollowUpTarget::Confirmed);
        assert_eq!(bolt.effect_names().collect::<Vec<_>>(), ["Bolt.Cast", "Bolt.Hit"]);

        assert_eq!(abilities[1], AbilitySpec::new("Ability.Wait"));
    }

    #[test]
    fn sets_bind_inputs() {
        let sets = AbilitySetLoader::parse(
            r#"(
                sets: [
                    (
                        name: "caster",
                        abilities: [
                            (ability: "Ability.Bolt", input: Some("Input.Primary")),
                            (ability: "Ability.Wait"),
                        ],
                    ),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(sets[0].abilities.len(), 2);
        assert_eq!(sets[0].abilities[1].input, None);
    }
}
