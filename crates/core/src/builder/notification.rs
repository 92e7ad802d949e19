//! `datosNotificacionGeneral`: who reported the case, and when.

use super::{coded, group, leaf, text, Inputs};
use crate::catalog::{COMPLETION_DATE_LINK_IDS, CONSULTATION_DATE_LEAF, REPORTER_PROFESSION};
use crate::error::optional;
use crate::resolvers;
use crate::MappingResult;
use fhir::{Answer, DocumentNode};

pub(super) fn section(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    Ok(group(
        "datosNotificacionGeneral",
        [reporter(inputs)?, dates(inputs)?],
    ))
}

fn reporter(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let view = inputs.view;

    let organisation = view
        .enrollment_org_unit_name()?
        .map(|name| text("nombreOrganizacionNotificadora", name));
    let address = inputs
        .config
        .organisation_address()
        .map(|address| text("nombreDireccionOrganizacion", address));
    let profession = resolvers::profession(optional(view.observation(REPORTER_PROFESSION))?);

    Ok(group(
        "datosNotificacion",
        [
            Some(coded("paisOrigen-Reg", inputs.config.country().clone())),
            organisation,
            address,
            Some(coded("codigoProfesionNotificador", profession)),
        ],
    ))
}

fn dates(inputs: &Inputs<'_>) -> MappingResult<Option<DocumentNode>> {
    let consultation = leaf(inputs, &CONSULTATION_DATE_LEAF)?;
    let completion = inputs.view.completion_date();

    let children = std::iter::once(consultation).chain(COMPLETION_DATE_LINK_IDS.iter().map(|id| {
        completion.map(|date| DocumentNode::answered(*id, Answer::Date(date.to_string())))
    }));

    Ok(group("fechas", children))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::catalog::CONSULTATION_DATE;
    use crate::context::MappingContext;
    use crate::error::LookupKind;
    use crate::source::SourceRecord;
    use crate::MappingError;

    fn run(
        record: &SourceRecord,
        config: &crate::config::MappingConfig,
    ) -> MappingResult<Option<DocumentNode>> {
        let cache = cache(&[]);
        let terminology = terminology(config);
        let ctx = context(record, &cache);
        section(&Inputs {
            view: &ctx,
            config,
            terminology: &terminology,
        })
    }

    #[test]
    fn reports_country_organisation_and_default_profession() {
        let node = run(&record(&[], &[]), &config()).expect("build").expect("present");

        let country = node.find("paisOrigen-Reg").expect("country");
        match country.answer() {
            Some(Answer::Coding(c)) => assert_eq!(c.code, "PRY"),
            other => panic!("unexpected answer {other:?}"),
        }

        let organisation = node.find("nombreOrganizacionNotificadora").expect("org");
        assert_eq!(
            organisation.answer(),
            Some(&Answer::String("Hospital Central".into()))
        );

        match node.find("codigoProfesionNotificador").and_then(DocumentNode::answer) {
            Some(Answer::Coding(c)) => assert_eq!(c.code, "6"),
            other => panic!("unexpected answer {other:?}"),
        }

        assert!(node.find("nombreDireccionOrganizacion").is_none());
        assert!(node.find("codigoDireccionOrganizacion").is_none());
    }

    #[test]
    fn configured_address_is_reported() {
        let config = config().with_organisation_address(Some("Asunción".into()));
        let node = run(&record(&[], &[]), &config).expect("build").expect("present");

        let address = node.find("nombreDireccionOrganizacion").expect("address");
        assert_eq!(address.answer(), Some(&Answer::String("Asunción".into())));
    }

    #[test]
    fn consultation_date_is_gated() {
        let node = run(
            &record(&[], &[(CONSULTATION_DATE, "2023-11-01")]),
            &config(),
        )
        .expect("build")
        .expect("present");

        let fechas = node.find("fechas").expect("fechas");
        let ids: Vec<&str> = fechas.items().iter().map(DocumentNode::link_id).collect();
        assert_eq!(
            ids,
            vec![
                "fechaConsulta",
                "fechaNotificacion",
                "fechaLlenadoFicha",
                "fechaRepoNacional"
            ]
        );
    }

    #[test]
    fn blank_org_unit_name_is_absent() {
        let mut rec = record(&[], &[]);
        rec.enrollments[0].org_unit_name = Some(" ".into());

        let node = run(&rec, &config()).expect("build").expect("present");
        assert!(node.find("nombreOrganizacionNotificadora").is_none());
    }

    #[test]
    fn missing_enrollment_is_not_found() {
        let rec = SourceRecord {
            subject_id: "X".into(),
            ..SourceRecord::default()
        };
        let cache = cache(&[]);
        let config = config();
        let terminology = terminology(&config);
        let ctx = MappingContext::new(&rec, &cache, STAGE).expect("context");

        let err = section(&Inputs {
            view: &ctx,
            config: &config,
            terminology: &terminology,
        })
        .expect_err("enrollment required");
        assert!(matches!(
            err,
            MappingError::NotFound {
                kind: LookupKind::Enrollment,
                ..
            }
        ));
    }
}
