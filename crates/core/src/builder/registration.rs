//! `registroESAVI`: the adverse events, their seriousness, outcome and causality.

use super::{coded, group, leaf, leaves, text, Inputs};
use crate::catalog::{
    AdverseEventSlot, CausalityCategory, LeafKind, LeafRule, ADVERSE_EVENT_DESCRIPTION,
    ADVERSE_EVENT_SLOTS, AUTOPSY, CAUSALITY_CATEGORIES, DEATH_DATE_LEAF,
    INVESTIGATION_START_LEAF, OTHER_IMPORTANT_EVENTS_TEXT_LEAF, OUTCOME,
    PREGNANCY_COMPLICATION_LEAVES, SERIOUS, SERIOUSNESS_CRITERIA, VERBAL_AUTOPSY,
};
use crate::constants::{CAUSALITY_SYSTEM, VOCAB_MEDDRA};
use crate::error::optional;
use crate::resolvers;
use crate::MappingResult;
use fhir::{Answer, CodedConcept, DocumentNode};

pub(super) fn section(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let mut children = Vec::new();

    for slot in &ADVERSE_EVENT_SLOTS {
        children.push(adverse_event(inputs, slot)?);
    }

    children.push(group(
        "ESAVIDuranteEmbarazo",
        leaves(inputs, &PREGNANCY_COMPLICATION_LEAVES)?,
    ));
    children.push(seriousness(inputs)?);
    children.push(outcome(inputs)?);
    children.extend(CAUSALITY_CATEGORIES.iter().map(|category| causality(inputs, category)));

    Ok(group("registroESAVI", children))
}

fn adverse_event(
    inputs: &Inputs<'_>,
    slot: &AdverseEventSlot,
) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let Some(event) = optional(view.observation(slot.event))? else {
        return Ok(None);
    };

    // The name is only reported for codes the MedDRA set knows.
    let name = if view.has_option(VOCAB_MEDDRA, event) {
        Some(text("nombreESAVI", view.option(VOCAB_MEDDRA, event)?))
    } else {
        None
    };
    let display = view.option_or(VOCAB_MEDDRA, event, "");

    let mut children = vec![
        name,
        Some(DocumentNode::answered(
            "IdentificadorESAVI",
            Answer::Integer(slot.position),
        )),
        Some(coded(
            "codigoESAVIMedDRA",
            inputs.terminology.meddra.resolve(event, &display),
        )),
    ];

    children.extend(leaves(
        inputs,
        &[
            LeafRule::observation("fechaESAVI", slot.start_date, LeafKind::Date),
            LeafRule::observation("horaESAVI", slot.start_time, LeafKind::Time),
            LeafRule::observation(
                "descripcionESAVI",
                ADVERSE_EVENT_DESCRIPTION,
                LeafKind::Text,
            ),
        ],
    )?);

    Ok(group("datosESAVI", children))
}

/// `tipoGravedad` is always reported; the criteria only when the case is serious.
fn seriousness(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let serious = view.observation_is_true(SERIOUS);

    let mut children = vec![Some(DocumentNode::answered(
        "tipoGravedad",
        Answer::Boolean(serious),
    ))];

    if serious {
        children.extend(SERIOUSNESS_CRITERIA.iter().map(|(link_id, field)| {
            view.observation_is_true(field)
                .then(|| DocumentNode::answered(*link_id, Answer::Boolean(true)))
        }));
        children.push(leaf(inputs, &OTHER_IMPORTANT_EVENTS_TEXT_LEAF)?);
    }

    Ok(group("gravedadESAVI", children))
}

fn outcome(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;

    let classification = resolvers::outcome(optional(view.observation(OUTCOME))?);
    let autopsy = resolvers::autopsy_requested(
        optional(view.observation(AUTOPSY))?,
        optional(view.observation(VERBAL_AUTOPSY))?,
    );

    Ok(group(
        "desenlaceESAVI",
        [
            Some(coded("codDesenlaceESAVI", classification.coding())),
            leaf(inputs, &DEATH_DATE_LEAF)?,
            Some(coded("autopsia", autopsy.coding())),
            leaf(inputs, &INVESTIGATION_START_LEAF)?,
        ],
    ))
}

/// One `causalidadESAVI` item per asserted category, each with its classification method.
fn causality(inputs: &Inputs<'_>, category: &CausalityCategory) -> Option<DocumentNode> {
    if !inputs.view.observation_is_true(category.field) {
        return None;
    }

    group(
        "causalidadESAVI",
        [
            Some(coded(
                "clasificacionDeCausalidadWHOAEFI",
                CodedConcept::new(CAUSALITY_SYSTEM, category.code, category.display),
            )),
            Some(coded("sistemaClasfcausalidad", resolvers::causality_method())),
        ],
    )
}
