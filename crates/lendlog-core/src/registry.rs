//! The person registry, rebuilt wholesale from the roster on every refresh.

use std::collections::HashMap;

use crate::movement::Person;

/// Minimum number of digits in a person id.
pub const MIN_PERSON_ID_LEN: usize = 6;

/// Whether `person_id` is made only of decimal digits and is long enough.
pub fn is_well_formed(person_id: &str) -> bool {
  let id = person_id.trim();
  id.len() >= MIN_PERSON_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

/// Outcome of checking a person id typed into a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonCheck {
  Empty,
  Malformed,
  /// Well-formed but not in the registry; carries the registry size.
  Unknown { known: usize },
  Found(Person),
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
  people: HashMap<String, Person>,
}

impl Registry {
  pub fn new() -> Self { Self::default() }

  /// Clear and repopulate. People without a well-formed id are dropped.
  pub fn replace(&mut self, people: impl IntoIterator<Item = Person>) {
    self.people.clear();
    for mut person in people {
      let id = person.person_id.trim().to_string();
      if !is_well_formed(&id) {
        continue;
      }
      person.person_id = id.clone();
      self.people.insert(id, person);
    }
  }

  pub fn find(&self, person_id: &str) -> Option<&Person> {
    self.people.get(person_id.trim())
  }

  pub fn count(&self) -> usize { self.people.len() }

  /// Classify a candidate id without side effects.
  pub fn check(&self, candidate: &str) -> PersonCheck {
    let id = candidate.trim();
    if id.is_empty() {
      PersonCheck::Empty
    } else if !is_well_formed(id) {
      PersonCheck::Malformed
    } else {
      match self.find(id) {
        Some(person) => PersonCheck::Found(person.clone()),
        None => PersonCheck::Unknown { known: self.count() },
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn person(id: &str) -> Person {
    Person {
      person_id: id.into(),
      full_name: format!("Person {id}"),
      group:     "9C".into(),
      phone:     String::new(),
    }
  }

  #[test]
  fn six_digits_is_the_minimum() {
    assert!(!is_well_formed("12345"));
    assert!(is_well_formed("123456"));
    assert!(is_well_formed(" 1234567 "));
  }

  #[test]
  fn non_digits_are_malformed() {
    assert!(!is_well_formed("12345a"));
    assert!(!is_well_formed("123-456"));
    assert!(!is_well_formed(""));
    assert!(!is_well_formed("１２３４５６"));
  }

  #[test]
  fn replace_drops_malformed_and_missing_ids() {
    let mut registry = Registry::new();
    registry.replace([
      person("123456"),
      person(""),
      person("999"),
      person("7654321"),
    ]);

    assert_eq!(registry.count(), 2);
    assert!(registry.find("123456").is_some());
    assert!(registry.find("999").is_none());
  }

  #[test]
  fn replace_is_wholesale() {
    let mut registry = Registry::new();
    registry.replace([person("123456")]);
    registry.replace([person("7654321")]);

    assert_eq!(registry.count(), 1);
    assert!(registry.find("123456").is_none());
  }

  #[test]
  fn ids_are_trimmed_on_load_and_lookup() {
    let mut registry = Registry::new();
    registry.replace([person(" 123456 ")]);
    assert_eq!(registry.find("123456").unwrap().person_id, "123456");
    assert!(registry.find(" 123456").is_some());
  }

  #[test]
  fn check_classifies_candidates() {
    let mut registry = Registry::new();
    registry.replace([person("123456"), person("234567")]);

    assert_eq!(registry.check("  "), PersonCheck::Empty);
    assert_eq!(registry.check("12345"), PersonCheck::Malformed);
    assert_eq!(registry.check("999999"), PersonCheck::Unknown { known: 2 });
    assert!(matches!(
      registry.check("123456"),
      PersonCheck::Found(p) if p.person_id == "123456"
    ));
  }
}
