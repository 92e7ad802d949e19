//! `antecedentesMedicos`: prior illnesses, allergies, COVID-19 history and pregnancy.

use super::{coded, group, leaves, text, Inputs};
use crate::catalog::{
    ADVERSE_HISTORY_LEAVES, PREGNANCY_LEAVES, PRIOR_ILLNESS_SLOTS, SARS_COV2_LEAVES,
};
use crate::constants::VOCAB_MEDDRA;
use crate::error::optional;
use crate::MappingResult;
use fhir::DocumentNode;

pub(super) fn section(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    Ok(group(
        "antecedentesMedicos",
        [
            prior_illnesses(inputs)?,
            group("antecedentesEventosAdversos", leaves(inputs, &ADVERSE_HISTORY_LEAVES)?),
            group("antecedentesSarsCov2", leaves(inputs, &SARS_COV2_LEAVES)?),
            group("pacienteEmbarazada", leaves(inputs, &PREGNANCY_LEAVES)?),
        ],
    ))
}

/// Each reported illness contributes a description and a MedDRA code, side by side.
fn prior_illnesses(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let mut children = Vec::new();

    for field in PRIOR_ILLNESS_SLOTS {
        let Some(code) = optional(view.observation(field))? else {
            continue;
        };

        let description = view.option(VOCAB_MEDDRA, code)?;
        let meddra = inputs.terminology.meddra.resolve(code, &description);

        children.push(Some(text("descripcionEnfPrevia", description)));
        children.push(Some(coded("codigoMedDRAEnfPrevia", meddra)));
    }

    Ok(group("antecedentesEnfermedadesPrevias", children))
}
