//! GdlAtlas: a grounding and stratification core for GDL-II
//!
//! This library turns a General Game Playing description (GDL/GDL-II) into
//! a ground, stratified rule table and evaluates it state by state into
//! boolean models, ready for consumption by model-checker and ASP code
//! generators.
//!
//! The pipeline: parse the description, compute constant domains per
//! argument position, eliminate variables by substitution, stratify the
//! ground program (breaking temporal cycles by reading the previous
//! state), simplify the rule table to a fixpoint, and evaluate successive
//! game states.

pub mod dependency;
pub mod domain;
pub mod error;
pub mod gdl;
pub mod grounding;
pub mod json;
pub mod literal;
pub mod model;
pub mod ruleset;
pub mod translate;

// Re-export commonly used types
pub use dependency::{DependencyGraph, Stratum, StratifyReport};
pub use domain::{DomainGraph, DomainValue, Vertex, VertexId, VertexKind};
pub use error::{Result, TranslationError, TranslationWarning};
pub use gdl::{parse_gdl, parse_term_sexpr, GdlTree, Node, NodeId, NodeKind, SExpr};
pub use grounding::{ground, GroundingResult};
pub use json::{HeadJson, TranslationJson};
pub use model::{initial_model, successor_model, Evaluation, Model};
pub use ruleset::{Disjunct, Entry, RuleSet};
pub use translate::{Translation, TranslationConfig, TranslationProfile};
