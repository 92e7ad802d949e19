//! `antecedentesFarmacosVacunas`: concomitant medication and administered vaccines.

use super::{coded, group, leaf, leaves, text, Inputs};
use crate::catalog::{
    vaccine_name_leaves, LeafKind, LeafRule, MedicationSlot, VaccineSlot, MEDICATION_SLOTS,
    OTHER_VERIFICATION_MECHANISM, VACCINATION_SITE, VACCINE_SLOTS, VERIFICATION_MECHANISM,
};
use crate::constants::{
    VOCAB_ADMINISTRATION_ROUTES, VOCAB_DILUENTS, VOCAB_PHARMACEUTICAL_FORMS,
    VOCAB_VACCINATION_SITES, VOCAB_WHODRUG, VOCAB_WHODRUG_COVID,
};
use crate::error::optional;
use crate::resolvers;
use crate::MappingResult;
use fhir::{Answer, DocumentNode};

pub(super) fn section(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let mut children = Vec::with_capacity(MEDICATION_SLOTS.len() + VACCINE_SLOTS.len());

    for slot in &MEDICATION_SLOTS {
        children.push(medication(inputs, slot)?);
    }
    for slot in &VACCINE_SLOTS {
        children.push(vaccine(inputs, slot)?);
    }

    Ok(group("antecedentesFarmacosVacunas", children))
}

fn medication(inputs: &Inputs<'_>, slot: &MedicationSlot) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let Some(drug) = optional(view.observation(slot.drug))? else {
        return Ok(None);
    };

    let name = view.option(VOCAB_WHODRUG, drug)?;
    let code = inputs.terminology.whodrug.resolve(drug, &name);

    let details = leaves(
        inputs,
        &[
            LeafRule::observation(
                "nombreFormaFarmaceutica",
                slot.form,
                LeafKind::Label(VOCAB_PHARMACEUTICAL_FORMS),
            ),
            LeafRule::observation(
                "nombreViaAdministracion",
                slot.route,
                LeafKind::Label(VOCAB_ADMINISTRATION_ROUTES),
            ),
        ],
    )?;

    let children = [
        Some(text("nombreMedicamento", name)),
        Some(coded("codigoMedicamento", code)),
    ]
    .into_iter()
    .chain(details);

    Ok(group("medicamento", children))
}

fn vaccine(inputs: &Inputs<'_>, slot: &VaccineSlot) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;
    let Some(vaccine) = optional(view.observation(slot.vaccine))? else {
        return Ok(None);
    };

    // Names fall back to the raw code; the coded WHODrug entry needs a known label.
    let display = view.option(VOCAB_WHODRUG_COVID, vaccine)?;
    let [name, normalised_name] = vaccine_name_leaves(slot);

    let mut children = vec![
        leaf(inputs, &name)?,
        Some(coded(
            "sistemaDeCodificacionParaNombreNormalizadoVacuna",
            resolvers::whodrug_coding_system(),
        )),
        leaf(inputs, &normalised_name)?,
        Some(DocumentNode::answered(
            "identificadorVacuna",
            Answer::Integer(slot.position),
        )),
        Some(coded(
            "codigoVacunaWHODrug",
            inputs.terminology.whodrug.resolve(vaccine, &display),
        )),
    ];

    children.extend(leaves(
        inputs,
        &[
            LeafRule::observation("nombreFabricante", slot.manufacturer, LeafKind::Text),
            LeafRule::observation("numeroDosisVacuna", slot.dose_number, LeafKind::Integer),
            LeafRule::observation("numeroLote", slot.batch, LeafKind::Text),
            LeafRule::observation("fechaVencimientoVacuna", slot.expiry_date, LeafKind::Date),
            LeafRule::observation(
                "nombreDiluyenteVacuna",
                slot.diluent,
                LeafKind::Label(VOCAB_DILUENTS),
            ),
            LeafRule::observation("numeroLoteDiluyente", slot.diluent_batch, LeafKind::Text),
            LeafRule::observation(
                "fechaVencimientoDiluyente",
                slot.diluent_expiry_date,
                LeafKind::Date,
            ),
            LeafRule::observation(
                "nombreVacunatorio",
                VACCINATION_SITE,
                LeafKind::Label(VOCAB_VACCINATION_SITES),
            ),
            LeafRule::observation("fechaVacunacion", slot.vaccination_date, LeafKind::Date),
            LeafRule::observation("horaVacunacion", slot.vaccination_time, LeafKind::Time),
        ],
    )?);

    if slot.position == 1 {
        children.push(
            optional(view.observation(VERIFICATION_MECHANISM))?.map(|code| {
                coded(
                    "codigoMecanismoVerificacion",
                    inputs.terminology.verification.resolve(code, code),
                )
            }),
        );
        children.push(leaf(
            inputs,
            &LeafRule::observation(
                "nombreOtroMecanismoVerificacion",
                OTHER_VERIFICATION_MECHANISM,
                LeafKind::Text,
            ),
        )?);
    }

    children.extend(leaves(
        inputs,
        &[
            LeafRule::observation(
                "fechaReconstitucionVacuna",
                slot.reconstitution_date,
                LeafKind::Date,
            ),
            LeafRule::observation(
                "horaReconstitucionVacuna",
                slot.reconstitution_time,
                LeafKind::Time,
            ),
        ],
    )?);

    Ok(group("datosVacunas", children))
}
