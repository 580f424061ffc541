//! Resolves a caller's [`GnssObservable`] recipes against an observation header's
//! per-constellation observable-code table into a column-index/coefficient plan
//! the streaming reader can apply without re-parsing strings on every epoch.
use gnss_core::prelude::{Constellation, GnssObservable, Observable};
use std::collections::HashMap;
use thiserror::Error;

#[cfg(feature = "log")]
use log::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecipeError {
    #[error("recipe mixes terms from more than one constellation")]
    MixedConstellation,
    #[error("constellation {0:?} is not present in this file's header")]
    UnknownConstellation(Constellation),
    #[error("observable {0} is not present in this file's header for {1:?}")]
    UnknownObservable(Observable, Constellation),
}

/// Controls what happens when a recipe references a constellation or observable
/// the header doesn't carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOptions {
    /// `true`: drop the offending recipe (and remove it from the caller's label
    /// list, to keep positional alignment) and keep going. `false`: fail the whole
    /// resolution.
    pub skip_missing: bool,
}

impl Default for RecipeOptions {
    fn default() -> Self {
        Self { skip_missing: true }
    }
}

/// One term of a resolved plan: the column index of the raw observable within the
/// header's per-constellation code list, and the recipe's coefficient for it.
pub type PlanTerm = (usize, f64);

/// One recipe's resolved plan: its terms, in the same order as the source recipe.
pub type Plan = Vec<PlanTerm>;

/// Per-constellation ordered list of resolved plans, one per surviving recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePlan {
    plans: HashMap<Constellation, Vec<Plan>>,
}

impl RecipePlan {
    pub fn plans_for(&self, constellation: Constellation) -> &[Plan] {
        self.plans
            .get(&constellation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn constellations(&self) -> impl Iterator<Item = &Constellation> {
        self.plans.keys()
    }
}

/// Resolves `user_map` against `header_codes` (the header's per-constellation
/// ordered observable-code list). On `skip_missing`, offending recipes are removed
/// from `user_map` in place so the caller's own label list (if any, kept alongside
/// `user_map` by the driver) stays aligned with the returned plan.
pub fn resolve(
    user_map: &mut HashMap<Constellation, Vec<GnssObservable>>,
    header_codes: &HashMap<Constellation, Vec<Observable>>,
    options: RecipeOptions,
) -> Result<RecipePlan, RecipeError> {
    let mut plan = RecipePlan::default();

    for (constellation, recipes) in user_map.iter_mut() {
        let mut surviving = Vec::new();
        let mut resolved_plans = Vec::new();

        for recipe in recipes.drain(..) {
            match resolve_one(&recipe, *constellation, header_codes, options)? {
                Some(resolved) => {
                    resolved_plans.push(resolved);
                    surviving.push(recipe);
                },
                None => {
                    #[cfg(feature = "log")]
                    warn!("dropping recipe for {constellation:?}: not resolvable against header");
                },
            }
        }

        *recipes = surviving;
        if !resolved_plans.is_empty() {
            plan.plans.insert(*constellation, resolved_plans);
        }
    }

    // constellations with every recipe dropped should not appear as an empty
    // entry; `HashMap::insert` above already only happens for non-empty plans, so
    // nothing further to prune here.
    Ok(plan)
}

fn resolve_one(
    recipe: &GnssObservable,
    declared_constellation: Constellation,
    header_codes: &HashMap<Constellation, Vec<Observable>>,
    options: RecipeOptions,
) -> Result<Option<Plan>, RecipeError> {
    if !recipe.is_single_constellation() {
        return Err(RecipeError::MixedConstellation);
    }
    let recipe_constellation = recipe.constellation().unwrap_or(declared_constellation);

    let codes = match header_codes.get(&recipe_constellation) {
        Some(codes) => codes,
        None => {
            if options.skip_missing {
                return Ok(None);
            }
            return Err(RecipeError::UnknownConstellation(recipe_constellation));
        },
    };

    let mut plan = Plan::with_capacity(recipe.terms().len());
    for term in recipe.terms() {
        match codes.iter().position(|c| *c == term.observable) {
            Some(idx) => plan.push((idx, term.coefficient)),
            None => {
                if options.skip_missing {
                    return Ok(None);
                }
                return Err(RecipeError::UnknownObservable(
                    term.observable,
                    recipe_constellation,
                ));
            },
        }
    }
    Ok(Some(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_core::prelude::ObservableKind;
    use std::str::FromStr;

    fn header_with_gps(codes: &[&str]) -> HashMap<Constellation, Vec<Observable>> {
        let mut m = HashMap::new();
        m.insert(
            Constellation::GPS,
            codes.iter().map(|c| Observable::from_str(c).unwrap()).collect(),
        );
        m
    }

    fn single_gps_recipe(code: &str, coef: f64) -> GnssObservable {
        GnssObservable::single(Constellation::GPS, Observable::from_str(code).unwrap(), coef)
    }

    #[test]
    fn alignment_holds_with_skip_missing() {
        let header = header_with_gps(&["C1C", "C2W"]);
        let mut user_map = HashMap::new();
        user_map.insert(
            Constellation::GPS,
            vec![
                single_gps_recipe("C1C", 1.0),
                single_gps_recipe("C5Q", 1.0), // absent
                single_gps_recipe("C2W", 1.0),
            ],
        );

        let plan = resolve(&mut user_map, &header, RecipeOptions { skip_missing: true }).unwrap();
        assert_eq!(plan.plans_for(Constellation::GPS).len(), 2);
        assert_eq!(user_map.get(&Constellation::GPS).unwrap().len(), 2);
    }

    #[test]
    fn fails_hard_without_skip_missing() {
        let header = header_with_gps(&["C1C", "C2W"]);
        let mut user_map = HashMap::new();
        user_map.insert(Constellation::GPS, vec![single_gps_recipe("C5Q", 1.0)]);

        let err = resolve(&mut user_map, &header, RecipeOptions { skip_missing: false }).unwrap_err();
        assert!(matches!(err, RecipeError::UnknownObservable(_, Constellation::GPS)));
    }

    #[test]
    fn unknown_constellation_dropped_silently() {
        let header = header_with_gps(&["C1C"]);
        let mut user_map = HashMap::new();
        user_map.insert(
            Constellation::Galileo,
            vec![GnssObservable::single(
                Constellation::Galileo,
                Observable::new(ObservableKind::Pseudorange, 1, 'C'),
                1.0,
            )],
        );
        let plan = resolve(&mut user_map, &header, RecipeOptions { skip_missing: true }).unwrap();
        assert!(plan.plans_for(Constellation::Galileo).is_empty());
    }

    #[test]
    fn mixed_constellation_recipe_always_errors() {
        let header = header_with_gps(&["C1C"]);
        let c1c = Observable::new(ObservableKind::Pseudorange, 1, 'C');
        let recipe = GnssObservable::new(vec![
            gnss_core::observable::ObservableTerm {
                constellation: Constellation::GPS,
                observable: c1c,
                coefficient: 1.0,
            },
            gnss_core::observable::ObservableTerm {
                constellation: Constellation::Galileo,
                observable: c1c,
                coefficient: 1.0,
            },
        ])
        .unwrap();
        let mut user_map = HashMap::new();
        user_map.insert(Constellation::GPS, vec![recipe]);
        let err = resolve(&mut user_map, &header, RecipeOptions { skip_missing: true }).unwrap_err();
        assert_eq!(err, RecipeError::MixedConstellation);
    }
}
