// 🗂️ Template Slots - up to four saved message variants
//
// Slots are small ordinals 1..=k with no gaps. Deleting renumbers the
// survivors, so the persisted mapping changes shape on delete.
// Every successful mutation writes the full mapping and the export slot.

use crate::storage::{
    read_or_none, write_or_warn, KeyValueStore, TEMPLATE_LEGACY_KEY, TEMPLATE_SELECTED_KEY,
    TEMPLATE_SLOTS_KEY,
};
use crate::template::DEFAULT_TEMPLATE;
use std::collections::BTreeMap;
use std::rc::Rc;

pub const MAX_SLOTS: u8 = 4;

pub type SlotNumber = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("最多只可有四個範本")]
pub struct CapacityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("至少要保留一個範本")]
pub struct MinimumSlotError;

pub struct TemplateStore {
    slots: BTreeMap<SlotNumber, String>,
    /// Slot open in the editor
    editing_slot: SlotNumber,
    /// Slot used by export and preview
    export_slot: SlotNumber,
    storage: Rc<dyn KeyValueStore>,
}

impl TemplateStore {
    /// Restore slots from storage, falling back to one default slot
    pub fn load(storage: Rc<dyn KeyValueStore>) -> Self {
        let mut slots = read_or_none(storage.as_ref(), TEMPLATE_SLOTS_KEY)
            .and_then(|json| parse_slots(&json))
            .unwrap_or_default();
        if slots.is_empty() {
            slots.insert(1, DEFAULT_TEMPLATE.to_string());
        }

        let mut export_slot = read_or_none(storage.as_ref(), TEMPLATE_SELECTED_KEY)
            .and_then(|s| s.trim().parse::<SlotNumber>().ok())
            .filter(|n| (1..=MAX_SLOTS).contains(n))
            .unwrap_or(1);
        if !slots.contains_key(&export_slot) {
            export_slot = 1;
        }

        // One-time migration from the single-template key
        if let Some(legacy) = read_or_none(storage.as_ref(), TEMPLATE_LEGACY_KEY) {
            let slot_one_is_default = slots
                .get(&1)
                .map_or(true, |t| t.is_empty() || t == DEFAULT_TEMPLATE);
            if slot_one_is_default && !legacy.is_empty() {
                tracing::info!("migrating legacy single template into slot 1");
                slots.insert(1, legacy);
            }
        }

        tracing::debug!(slots = slots.len(), export_slot, "template slots loaded");
        TemplateStore {
            slots,
            editing_slot: export_slot,
            export_slot,
            storage,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Stored text, or the default when the slot is empty or missing
    pub fn get_template(&self, slot: SlotNumber) -> &str {
        match self.slots.get(&slot) {
            Some(text) if !text.trim().is_empty() => text,
            _ => DEFAULT_TEMPLATE,
        }
    }

    /// Template text used for preview and export
    pub fn export_template(&self) -> &str {
        self.get_template(self.export_slot).trim()
    }

    pub fn slot_numbers(&self) -> Vec<SlotNumber> {
        self.slots.keys().copied().collect()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn editing_slot(&self) -> SlotNumber {
        self.editing_slot
    }

    pub fn export_slot(&self) -> SlotNumber {
        self.export_slot
    }

    /// Drives visibility of the "+" control
    pub fn can_add_slot(&self) -> bool {
        self.slots.len() < MAX_SLOTS as usize
    }

    /// Drives visibility of the delete control
    pub fn can_delete_slot(&self) -> bool {
        self.slots.len() > 1
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Store trimmed text; blank input stores the default instead.
    /// Unknown slots are ignored.
    pub fn set_template(&mut self, slot: SlotNumber, text: &str) {
        let Some(entry) = self.slots.get_mut(&slot) else {
            tracing::debug!(slot, "set_template on missing slot ignored");
            return;
        };
        let trimmed = text.trim();
        *entry = if trimmed.is_empty() {
            DEFAULT_TEMPLATE.to_string()
        } else {
            trimmed.to_string()
        };
        self.persist();
    }

    /// Append a slot seeded with the default template and open it
    pub fn add_slot(&mut self) -> Result<SlotNumber, CapacityError> {
        if !self.can_add_slot() {
            return Err(CapacityError);
        }
        let next = self.slots.keys().next_back().map_or(1, |max| max + 1);
        self.slots.insert(next, DEFAULT_TEMPLATE.to_string());
        self.editing_slot = next;
        self.export_slot = next;
        tracing::debug!(slot = next, "template slot added");
        self.persist();
        Ok(next)
    }

    /// Remove a slot, renumber the rest to 1..k keeping their order,
    /// then point editing and export back at slot 1
    pub fn delete_slot(&mut self, slot: SlotNumber) -> Result<(), MinimumSlotError> {
        if !self.can_delete_slot() {
            return Err(MinimumSlotError);
        }
        if self.slots.remove(&slot).is_none() {
            tracing::debug!(slot, "delete_slot on missing slot ignored");
            return Ok(());
        }
        self.slots = renumber(std::mem::take(&mut self.slots));
        self.editing_slot = 1;
        self.export_slot = 1;
        tracing::debug!(slot, remaining = self.slots.len(), "template slot deleted");
        self.persist();
        Ok(())
    }

    /// Choose the slot export uses without changing what is being edited
    pub fn select_export_slot(&mut self, slot: SlotNumber) {
        if !self.slots.contains_key(&slot) {
            return;
        }
        self.export_slot = slot;
        self.persist();
    }

    /// Open a slot in the editor; it also becomes the export slot
    pub fn switch_slot(&mut self, slot: SlotNumber) {
        if !self.slots.contains_key(&slot) {
            return;
        }
        self.editing_slot = slot;
        self.export_slot = slot;
        self.persist();
    }

    fn persist(&self) {
        let mapping: BTreeMap<String, &str> = self
            .slots
            .iter()
            .map(|(n, text)| (n.to_string(), text.as_str()))
            .collect();
        match serde_json::to_string(&mapping) {
            Ok(json) => write_or_warn(self.storage.as_ref(), TEMPLATE_SLOTS_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "could not serialize template slots"),
        }
        write_or_warn(
            self.storage.as_ref(),
            TEMPLATE_SELECTED_KEY,
            &self.export_slot.to_string(),
        );
    }
}

/// Parse `{"1": "...", "2": "..."}`; junk keys are dropped and the rest
/// renumbered. `None` when the JSON itself is unusable.
fn parse_slots(json: &str) -> Option<BTreeMap<SlotNumber, String>> {
    let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "stored template slots are corrupt, using default");
            return None;
        }
    };

    let valid: BTreeMap<SlotNumber, String> = raw
        .into_iter()
        .filter_map(|(key, value)| {
            let n = key.trim().parse::<SlotNumber>().ok()?;
            let text = value.as_str()?.to_string();
            Some((n, text))
        })
        .filter(|(n, _)| (1..=MAX_SLOTS).contains(n))
        .collect();

    Some(renumber(valid))
}

fn renumber(slots: BTreeMap<SlotNumber, String>) -> BTreeMap<SlotNumber, String> {
    slots
        .into_values()
        .zip(1..)
        .map(|(text, n)| (n, text))
        .collect()
}
