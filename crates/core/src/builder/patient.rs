//! `datosIdVacunado`: the vaccinated person.

use super::{coded, group, leaf, Inputs};
use crate::catalog::{
    BIRTH_DATE_LEAF, CASE_NUMBER_LEAF, PATIENT_IDENTIFIER_LEAF, RESIDENCE_LEAF, SEX,
};
use crate::error::optional;
use crate::resolvers;
use crate::MappingResult;
use fhir::DocumentNode;

pub(super) fn section(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let sex = resolvers::administrative_sex(optional(inputs.view.attribute(SEX))?);

    let patient = group(
        "datosPaciente",
        [
            leaf(inputs, &CASE_NUMBER_LEAF)?,
            leaf(inputs, &PATIENT_IDENTIFIER_LEAF)?,
            leaf(inputs, &RESIDENCE_LEAF)?,
            Some(coded("sexoPaciente", sex)),
            leaf(inputs, &BIRTH_DATE_LEAF)?,
        ],
    );

    Ok(group("datosIdVacunado", [patient]))
}
