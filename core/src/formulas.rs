//! Formula book: the character's known recipes.
//!
//! The list is persisted on the actor by the host. This module resolves it
//! for display and edits it on learn/forget; it is also the drag source for
//! the preparation queue.

use std::collections::BTreeMap;
use std::sync::Arc;

use alembic_types::{FormulaBookView, KnownFormula, formatting};

use crate::drag::DropData;
use crate::error::{AlembicError, Result};
use crate::host::{ChatMessage, FormulaEntry, Host, ItemTemplate, TemplateRef, bound_character};

/// Extract the DC from an inline check tag like `@Check[crafting|dc:15]`.
pub fn parse_check_dc(description: &str) -> Option<u32> {
    let mut rest = description;
    while let Some(start) = rest.find("@Check[") {
        let body = &rest[start + "@Check[".len()..];
        let end = body.find(']')?;
        let inner = &body[..end];
        if let Some(pos) = inner.rfind("|dc:")
            && let Ok(dc) = inner[pos + "|dc:".len()..].parse()
        {
            return Some(dc);
        }
        rest = &body[end..];
    }
    None
}

fn entry_from_template(template: &ItemTemplate) -> FormulaEntry {
    FormulaEntry {
        uuid: template.uuid.clone(),
        name: template.name.clone(),
        level: template.level,
        item_type: template.item_type.clone(),
        img: template.img.clone(),
        dc: parse_check_dc(&template.description),
    }
}

/// Drag payload for a formula in the book.
pub fn drag_payload(formula: &KnownFormula) -> String {
    DropData::formula(TemplateRef::new(formula.source_ref.clone())).to_json()
}

/// Group an already sorted list by level.
pub fn group_by_level(formulas: Vec<KnownFormula>) -> FormulaBookView {
    let mut formulas_by_level: BTreeMap<i32, Vec<KnownFormula>> = BTreeMap::new();
    for formula in formulas {
        formulas_by_level.entry(formula.level).or_default().push(formula);
    }
    FormulaBookView { formulas_by_level }
}

#[derive(Debug)]
pub struct FormulaRegistry<H> {
    host: Arc<H>,
}

impl<H: Host> FormulaRegistry<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// Known formulas sorted by level, then name. References that no longer
    /// resolve are skipped.
    pub async fn known(&self) -> Result<Vec<KnownFormula>> {
        let actor = bound_character(&*self.host).await?;
        let entries = self.host.known_formulas(&actor.id).await?;

        let mut formulas = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(template) = self.host.resolve(&entry.uuid).await else {
                tracing::debug!(uuid = %entry.uuid, "Skipping unresolvable formula");
                continue;
            };
            formulas.push(KnownFormula {
                name: template.name.clone(),
                source_ref: entry.uuid.to_string(),
                dc: parse_check_dc(&template.description),
                level: template.level,
                item_type: template.item_type.clone(),
                img: template.img.clone(),
                is_alchemical: template.is_alchemical,
            });
        }
        formulas.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        Ok(formulas)
    }

    pub async fn by_level(&self) -> Result<FormulaBookView> {
        Ok(group_by_level(self.known().await?))
    }

    /// Learn the formula carried by a drop payload. Returns the learned name.
    pub async fn learn(&self, payload: &str) -> Result<Option<String>> {
        let data = DropData::parse(payload)?;
        if !data.is_item() {
            return Ok(None);
        }
        let actor = bound_character(&*self.host).await?;
        let template = self
            .host
            .resolve(&data.uuid)
            .await
            .ok_or_else(|| AlembicError::TemplateNotFound(data.uuid.clone()))?;
        if !template.is_formula() && !template.is_consumable() {
            return Err(AlembicError::NotConvertible {
                name: template.name,
            });
        }

        let mut entries = self.host.known_formulas(&actor.id).await?;
        if entries.iter().any(|e| e.uuid == data.uuid) {
            return Err(AlembicError::AlreadyKnown {
                name: template.name,
            });
        }
        entries.push(entry_from_template(&template));
        self.host.set_known_formulas(&actor.id, entries).await?;
        tracing::info!(actor = %actor.id, formula = %template.name, "Learned formula");
        Ok(Some(template.name))
    }

    /// Post an info card for a template to chat, spoken by the bound character.
    pub async fn share(&self, uuid: &TemplateRef) -> Result<()> {
        let actor = bound_character(&*self.host).await?;
        let template = self
            .host
            .resolve(uuid)
            .await
            .ok_or_else(|| AlembicError::TemplateNotFound(uuid.clone()))?;
        let card = formatting::formula_card(
            &template.name,
            template.level,
            &template.item_type,
            parse_check_dc(&template.description),
        );
        self.host.post(ChatMessage::public(&actor.id, card)).await;
        tracing::debug!(actor = %actor.id, formula = %template.name, "Shared formula");
        Ok(())
    }

    /// Forget a formula. Returns whether anything was removed.
    pub async fn forget(&self, uuid: &TemplateRef) -> Result<bool> {
        let actor = bound_character(&*self.host).await?;
        let mut entries = self.host.known_formulas(&actor.id).await?;
        let before = entries.len();
        entries.retain(|e| &e.uuid != uuid);
        if entries.len() == before {
            return Ok(false);
        }
        self.host.set_known_formulas(&actor.id, entries).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::test_support::{BOMB, BOMB_FORMULA, ELIXIR, TORCH, alchemist, template, world};

    fn drop_of(uuid: &str) -> String {
        format!(r#"{{"type":"Item","uuid":"{uuid}"}}"#)
    }

    #[test]
    fn dc_is_read_from_check_tag() {
        assert_eq!(parse_check_dc("Roll @Check[crafting|dc:18] now"), Some(18));
        assert_eq!(
            parse_check_dc("@Check[will|basic] then @Check[reflex|dc:21]"),
            Some(21)
        );
        assert_eq!(parse_check_dc("@Check[crafting|dc:abc]"), None);
        assert_eq!(parse_check_dc("no tags here"), None);
        assert_eq!(parse_check_dc("@Check[unterminated|dc:4"), None);
    }

    #[tokio::test]
    async fn learn_then_list_sorted() {
        let host = world(1);
        let mut high = template("high", "Antidote (Major)", "consumable");
        high.level = 9;
        host.add_template(high);
        let registry = FormulaRegistry::new(Arc::clone(&host));

        for uuid in ["high", ELIXIR, BOMB_FORMULA] {
            registry.learn(&drop_of(uuid)).await.unwrap();
        }
        let names: Vec<String> = registry.known().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "Elixir of Life (Minor)",
                "Formula: Alchemist's Fire (Lesser)",
                "Antidote (Major)"
            ]
        );

        let known = registry.known().await.unwrap();
        assert_eq!(known[1].dc, Some(15));
        assert_eq!(host.formulas_of(&alchemist())[2].dc, Some(15));
    }

    #[tokio::test]
    async fn duplicates_and_non_consumables_are_refused() {
        let host = world(1);
        let registry = FormulaRegistry::new(Arc::clone(&host));

        registry.learn(&drop_of(ELIXIR)).await.unwrap();
        assert!(matches!(
            registry.learn(&drop_of(ELIXIR)).await,
            Err(AlembicError::AlreadyKnown { .. })
        ));
        assert!(matches!(
            registry.learn(&drop_of(TORCH)).await,
            Err(AlembicError::NotConvertible { .. })
        ));
        // Weapons are not convertible either, only their formulas
        assert!(matches!(
            registry.learn(&drop_of(BOMB)).await,
            Err(AlembicError::NotConvertible { .. })
        ));
        assert_eq!(host.formulas_of(&alchemist()).len(), 1);
    }

    #[tokio::test]
    async fn forget_removes_and_reports() {
        let host = world(1);
        let registry = FormulaRegistry::new(Arc::clone(&host));
        registry.learn(&drop_of(ELIXIR)).await.unwrap();

        assert!(registry.forget(&TemplateRef::from(ELIXIR)).await.unwrap());
        assert!(!registry.forget(&TemplateRef::from(ELIXIR)).await.unwrap());
        assert!(registry.known().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_entries_are_skipped() {
        let host = world(1);
        let registry = FormulaRegistry::new(Arc::clone(&host));
        registry.learn(&drop_of(ELIXIR)).await.unwrap();

        let mut entries = host.formulas_of(&alchemist());
        entries.push(FormulaEntry {
            uuid: TemplateRef::from("deleted"),
            name: "Gone".to_string(),
            level: 0,
            item_type: "consumable".to_string(),
            img: None,
            dc: None,
        });
        crate::host::InventoryClient::set_known_formulas(&*host, &alchemist(), entries)
            .await
            .unwrap();

        assert_eq!(registry.known().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn share_posts_an_info_card() {
        let host = world(1);
        let registry = FormulaRegistry::new(Arc::clone(&host));

        registry.share(&TemplateRef::from(BOMB_FORMULA)).await.unwrap();
        registry.share(&TemplateRef::from(ELIXIR)).await.unwrap();

        let chat = host.chat_log();
        assert_eq!(chat.len(), 2);
        assert_eq!(chat[0].speaker, Some(alchemist()));
        assert_eq!(
            chat[0].content,
            "Formula: Alchemist's Fire (Lesser)\nLevel: 1\nType: formula\nDC: 15"
        );
        assert!(chat[1].content.ends_with("DC: N/A"));
        assert!(matches!(
            registry.share(&TemplateRef::from("nowhere")).await,
            Err(AlembicError::TemplateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn grouped_view_and_drag_payload() {
        let host = world(1);
        let registry: FormulaRegistry<MemoryHost> = FormulaRegistry::new(Arc::clone(&host));
        registry.learn(&drop_of(ELIXIR)).await.unwrap();
        registry.learn(&drop_of(BOMB_FORMULA)).await.unwrap();

        let view = registry.by_level().await.unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.formulas_by_level[&1].len(), 2);

        let payload = drag_payload(&view.formulas_by_level[&1][0]);
        let data = DropData::parse(&payload).unwrap();
        assert!(data.is_formula);
    }
}
