use crate::infra::{
    load_contract_template, HtmlFileRenderer, InMemoryApplicantRepository,
    InMemoryStudentRegistry, PlaceholderFiller,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use school_enrollment::config::AppConfig;
use school_enrollment::error::AppError;
use school_enrollment::workflows::enrollment::{
    Address, Applicant, ApplicantId, ContractPipeline, DeliveryMethod, DiscountProgram, Document,
    DocumentDecision, DocumentStatus, EnrollmentService, EnrollmentStatus, FinancialTerms,
    Guardian, PaymentMethod, StudentIdentity, ValidationFlag,
};
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = EnrollmentService<InMemoryApplicantRepository, InMemoryStudentRegistry>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Contract issue date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) issued_on: Option<NaiveDate>,
    /// Directory for the rendered contract. Defaults to CONTRACT_OUTPUT_DIR.
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Stop before generating the contract document.
    #[arg(long)]
    pub(crate) skip_contract: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        issued_on,
        output_dir,
        skip_contract,
    } = args;

    let config = AppConfig::load()?;
    let issued_on = issued_on.unwrap_or_else(|| Local::now().date_naive());
    let output_dir = output_dir.unwrap_or_else(|| config.contract.output_dir.clone());

    let registry = Arc::new(InMemoryStudentRegistry::default());
    let pipeline = Arc::new(ContractPipeline::new(
        Arc::new(PlaceholderFiller),
        Arc::new(HtmlFileRenderer::new(output_dir)),
    ));
    let service = EnrollmentService::new(
        Arc::new(InMemoryApplicantRepository::default()),
        registry.clone(),
        pipeline,
        config.school.clone(),
        load_contract_template(&config.contract)?,
    );

    println!("Enrollment desk demo");
    println!("  School: {} ({})", config.school.name, config.school.tax_id);
    println!("  Issue date: {}", issued_on);

    let applicant = match service.register(demo_applicant()) {
        Ok(applicant) => applicant,
        Err(err) => {
            println!("  Intake rejected: {}", err);
            return Ok(());
        }
    };
    let id = applicant.id.clone();
    println!(
        "\n- Registered {} for {} ({} documents)",
        applicant.student.full_name,
        applicant.student.grade.as_deref().unwrap_or("unassigned grade"),
        applicant.documents.len()
    );
    print_readiness(&service, &id, false)?;
    let waiting = service.pending_applicants(10, false)?;
    println!("  Applicants awaiting analysis: {}", waiting.len());

    println!("\nDocument review");
    let blank = DocumentDecision::Reject {
        reason: "   ".to_string(),
    };
    if let Err(err) = service.update_document(&id, "Vaccination card", &blank) {
        println!("  Blank rejection refused: {}", err);
    }

    let reject = DocumentDecision::Reject {
        reason: "photo is unreadable".to_string(),
    };
    let documents = service.update_document(&id, "Vaccination card", &reject)?;
    print_documents(&documents);

    let draft = service.rejection_draft(&id, "Vaccination card")?;
    println!("  Reopening the rejection would start from: \"{}\"", draft);

    println!("  Family re-sent the vaccination card; approving the checklist in order");
    let mut documents = Vec::new();
    for index in 0..applicant.documents.len() {
        documents = service.update_document_at(&id, index, &DocumentDecision::Approve)?;
    }
    print_documents(&documents);

    for flag in [
        ValidationFlag::Data,
        ValidationFlag::GuardianData,
        ValidationFlag::Payment,
    ] {
        service.set_validation_flag(&id, flag, true)?;
    }
    println!("  Student data, guardian data and payment confirmed");

    println!("\nSave without the financial review");
    let transition = service.recompute_status(&id, false)?;
    println!(
        "  Status: {} -> {}",
        transition.from.label(),
        transition.to.label()
    );
    if let Err(err) = service.attempt_finalize(&id, false) {
        println!("  Finalize refused: {}", err);
    }

    println!("\nSave after the financial review");
    let transition = service.recompute_status(&id, true)?;
    println!(
        "  Status: {} -> {}",
        transition.from.label(),
        transition.to.label()
    );
    print_readiness(&service, &id, true)?;

    if skip_contract {
        println!("\n  Contract generation skipped");
    } else {
        match service.download_contract(&id, true, issued_on).await {
            Ok(contract) => println!(
                "\n- Contract {} written to {} ({}, {} bytes)",
                contract.file_stem,
                contract.artifact.location,
                contract.artifact.content_type,
                contract.artifact.bytes
            ),
            Err(err) => {
                println!("\n  Contract generation failed: {}", err);
                return Ok(());
            }
        }
    }

    let record = service.attempt_finalize(&id, true)?;
    println!(
        "\n- {} enrolled as {} at {}",
        record.student_name,
        record.student_id,
        record.enrolled_at.to_rfc3339()
    );
    println!("  Enrolled students on record: {}", registry.students().len());
    match service.get(&id) {
        Ok(_) => println!("  Applicant record still present"),
        Err(err) => println!("  Applicant lookup after finalize: {}", err),
    }

    Ok(())
}

fn print_readiness(
    service: &DemoService,
    id: &ApplicantId,
    financials_validated: bool,
) -> Result<(), AppError> {
    let view = service.readiness(id, financials_validated)?;
    println!("  Stored status: {} | {}", view.status, view.readiness);
    Ok(())
}

fn print_documents(documents: &[Document]) {
    for document in documents {
        match &document.rejection_reason {
            Some(reason) => println!(
                "  {}: {} ({})",
                document.name,
                document.status.label(),
                reason
            ),
            None => println!("  {}: {}", document.name, document.status.label()),
        }
    }
}

fn demo_applicant() -> Applicant {
    Applicant {
        id: ApplicantId("app-demo-0001".to_string()),
        student: StudentIdentity {
            full_name: "Helena Duarte Lima".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2017, 5, 14),
            tax_id: None,
            grade: Some("2nd grade".to_string()),
            class_name: Some("2A".to_string()),
            shift: Some("morning".to_string()),
        },
        guardians: vec![Guardian {
            name: "Paula Duarte".to_string(),
            tax_id: "321.654.987-00".to_string(),
            email: "paula.duarte@example.com".to_string(),
            phone: "+55 11 95555-1234".to_string(),
        }],
        address: Address {
            street: "Rua Harmonia".to_string(),
            number: "315".to_string(),
            complement: Some("casa 2".to_string()),
            neighborhood: "Vila Madalena".to_string(),
            city: "Sao Paulo".to_string(),
            state: "SP".to_string(),
            postal_code: "05435-000".to_string(),
        },
        financials: FinancialTerms {
            fee_one: 45_000,
            fee_recurring: 189_900,
            discount_program: Some(DiscountProgram {
                name: "Early registration".to_string(),
                percent: 5,
            }),
        },
        documents: vec![
            demo_document("Birth certificate", DeliveryMethod::InPerson),
            demo_document("Vaccination card", DeliveryMethod::Digital),
            demo_document("Proof of address", DeliveryMethod::Digital),
        ],
        data_validated: false,
        guardian_data_validated: false,
        payment_confirmed: false,
        payment_method: Some(PaymentMethod::BankSlip),
        status: EnrollmentStatus::PendingAnalysis,
    }
}

fn demo_document(name: &str, delivery_method: DeliveryMethod) -> Document {
    Document {
        name: name.to_string(),
        delivery_method,
        status: DocumentStatus::Pending,
        rejection_reason: None,
        file_reference: None,
    }
}
