//! Centralized text for chat log entries and notices.
//!
//! All player-facing strings go through this module so the tracker, the
//! formula book and the CLI word things the same way.

/// Join item names for a chat line, in the order given.
///
/// # Examples
/// ```
/// use alembic_types::formatting::join_names;
/// assert_eq!(join_names(["Elixir", "Bomb"]), "Elixir, Bomb");
/// assert_eq!(join_names(Vec::<&str>::new()), "");
/// ```
pub fn join_names<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name.as_ref());
    }
    out
}

/// Compact `current/max` counter used by both windows.
///
/// # Examples
/// ```
/// use alembic_types::formatting::format_count;
/// assert_eq!(format_count(3, 4), "3/4");
/// ```
pub fn format_count(current: impl std::fmt::Display, max: impl std::fmt::Display) -> String {
    format!("{current}/{max}")
}

pub fn vial_count_label(current: u32, max: u32) -> String {
    format!("Versatile Vials: {}", format_count(current, max))
}

pub fn preparations_label(used: usize, max: u32) -> String {
    format!("Daily Preparations: {}", format_count(used, max))
}

pub fn vial_added() -> String {
    "Added a Versatile Vial.".to_string()
}

pub fn vial_removed() -> String {
    "Used a Versatile Vial.".to_string()
}

/// # Examples
/// ```
/// use alembic_types::formatting::vials_added;
/// assert_eq!(vials_added(2), "Added 2 Versatile Vial(s).");
/// ```
pub fn vials_added(quantity: u32) -> String {
    format!("Added {quantity} Versatile Vial(s).")
}

pub fn vials_refilled(max: u32) -> String {
    format!("Refilled Versatile Vials to maximum capacity ({max}).")
}

pub fn vials_reduced(reduction: u32) -> String {
    format!("Reduced Versatile Vials in inventory by {reduction} to match new maximum.")
}

pub fn max_vials_reached(max: u32) -> String {
    format!("Maximum number of vials ({max}) reached!")
}

pub fn max_items_reached(max: u32) -> String {
    format!("Maximum number of items ({max}) reached!")
}

pub fn no_vials() -> String {
    "You have no Versatile Vials left.".to_string()
}

/// # Examples
/// ```
/// use alembic_types::formatting::infused_added;
/// assert_eq!(infused_added(3), "Added 3 infused items to inventory.");
/// ```
pub fn infused_added(count: usize) -> String {
    format!("Added {count} infused items to inventory.")
}

pub fn commit_failed() -> String {
    "Failed to add items to inventory.".to_string()
}

pub fn nothing_to_commit() -> String {
    "No items to add to inventory.".to_string()
}

/// # Examples
/// ```
/// use alembic_types::formatting::infused_created;
/// assert_eq!(
///     infused_created(["Elixir", "Elixir", "Bomb"]),
///     "Created 3 infused alchemical items: Elixir, Elixir, Bomb"
/// );
/// ```
pub fn infused_created<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<S> = names.into_iter().collect();
    format!(
        "Created {} infused alchemical items: {}",
        names.len(),
        join_names(names)
    )
}

pub fn infused_expired_for_owner(count: usize, creator_name: &str) -> String {
    format!("{count} infused items created by {creator_name} have expired from your inventory.")
}

pub fn infused_expired_summary(count: usize) -> String {
    format!("{count} infused items you created for other characters have expired.")
}

pub fn ten_minutes_passed() -> String {
    "Ten minutes have passed. You may add Versatile Vials.".to_string()
}

pub fn preparations_reset() -> String {
    "Daily preparations have been reset.".to_string()
}

pub fn settings_updated() -> String {
    "Alembic settings updated.".to_string()
}

pub fn no_active_character() -> String {
    "No active character found.".to_string()
}

pub fn formula_learned(name: &str) -> String {
    format!("Added {name} to known formulas.")
}

pub fn formula_already_known(name: &str) -> String {
    format!("{name} is already in your known formulas.")
}

pub fn formula_not_convertible(name: &str) -> String {
    format!("{name} cannot be converted to a formula.")
}

pub fn formula_forgotten() -> String {
    "Formula removed from known formulas.".to_string()
}

/// Info card posted when a formula is shared to chat.
///
/// # Examples
/// ```
/// use alembic_types::formatting::formula_card;
/// assert_eq!(
///     formula_card("Bomb", 1, "weapon", None),
///     "Bomb\nLevel: 1\nType: weapon\nDC: N/A"
/// );
/// ```
pub fn formula_card(name: &str, level: i32, item_type: &str, dc: Option<u32>) -> String {
    let dc = dc.map_or_else(|| "N/A".to_string(), |dc| dc.to_string());
    format!("{name}\nLevel: {level}\nType: {item_type}\nDC: {dc}")
}
