//! Interactive shell over the hospital facade.
//!
//! Every command collects input, calls one facade operation and renders the
//! result. Business rules live entirely in `ward-core`; the shell only
//! parses, confirms destructive actions and decides which desks are visible
//! for the current role.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ward_core::{
    AppointmentChange, Hospital, InventoryItemChange, LineItem, MedicalRecordChange, Money,
    NewAppointment, NewInventoryItem, NewMedicalRecord, NewPatient, NonEmptyText,
};

use crate::render;
use crate::Role;

const HELP: &str = "\
Commands:
  patient add <yyyy-mm-dd> <name>     appt add <patient> <date> <time> <kind>
  patient list|show|find …            appt list | show <id>
  patient admit|discharge <id>        appt move <id> <date> <time> <kind>
  patient delete <id>                 appt complete|cancel|delete <id>
  record add <patient> <appt> <date> <diagnosis>
  record note <id> <notes>            record list | show <id> | delete <id>
  bill create <patient>               stock add <qty> <price> <name>
  bill item <id> <amount> <desc>      stock in|out <id> <n>
  bill pay <id> <reference>           stock price <id> <price>
  bill list | show <id> | delete <id> stock list | delete <id>
  export <patients|appointments|records|bills|inventory>
  help | quit";

/// Runs the interactive shell until `quit` or end of input.
pub fn run(hospital: &Hospital, role: Role) -> Result<(), Box<dyn std::error::Error>> {
    println!("ward console ({:?} desk). Type 'help' for commands.", role);

    let stdin = io::stdin();
    loop {
        print!("ward> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // end of input
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if line == "help" {
            println!("{HELP}");
            continue;
        }

        if let Err(message) = dispatch(hospital, role, line) {
            println!("{message}");
        }
    }

    Ok(())
}

fn dispatch(hospital: &Hospital, role: Role, line: &str) -> Result<(), String> {
    let (desk, rest) = split_first(line);
    match desk {
        "patient" => patient_cmd(hospital, rest),
        "appt" => appointment_cmd(hospital, rest),
        "record" => record_cmd(hospital, rest),
        "bill" => admin_only(role, "billing").and_then(|()| bill_cmd(hospital, rest)),
        "stock" => admin_only(role, "inventory").and_then(|()| stock_cmd(hospital, rest)),
        "export" => export_cmd(hospital, role, rest),
        other => Err(format!("Unknown command '{other}'. Type 'help' for commands.")),
    }
}

/// Billing and inventory are admin-desk commands. This is console policy,
/// not a core rule.
fn admin_only(role: Role, desk: &str) -> Result<(), String> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(format!("The {desk} desk is restricted to the admin role."))
    }
}

fn split_first(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("'{text}' is not a date (expected yyyy-mm-dd)."))
}

fn parse_datetime(date: &str, time: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("'{date} {time}' is not a date and time (expected yyyy-mm-dd hh:mm)."))
}

fn parse_money(text: &str) -> Result<Money, String> {
    text.parse::<Money>()
        .map_err(|e| format!("'{text}' is not an amount: {e}."))
}

fn parse_text(text: &str, what: &str) -> Result<NonEmptyText, String> {
    NonEmptyText::new(text).map_err(|_| format!("The {what} cannot be empty."))
}

fn parse_count(text: &str) -> Result<u32, String> {
    text.parse::<u32>()
        .map_err(|_| format!("'{text}' is not a whole number."))
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn patient_cmd(hospital: &Hospital, rest: &str) -> Result<(), String> {
    let (verb, args) = split_first(rest);
    match verb {
        "add" => {
            let (dob, name) = split_first(args);
            let patient = hospital
                .register_patient(NewPatient {
                    name: parse_text(name, "patient name")?,
                    date_of_birth: parse_date(dob)?,
                })
                .map_err(|e| render::describe(&e))?;
            println!("Registered {}", render::patient_line(&patient));
            Ok(())
        }
        "list" => {
            let patients = hospital.list_patients().map_err(|e| render::describe(&e))?;
            if patients.is_empty() {
                println!("No patients registered.");
            }
            for patient in patients {
                println!("{}", render::patient_line(&patient));
            }
            Ok(())
        }
        "show" => {
            match hospital
                .find_patient(args)
                .map_err(|e| render::describe(&e))?
            {
                Some(patient) => println!("{}", render::patient_line(&patient)),
                None => println!("No patient with id {args} exists."),
            }
            Ok(())
        }
        "find" => {
            let needle = args.to_lowercase();
            let patients = hospital.list_patients().map_err(|e| render::describe(&e))?;
            let mut any = false;
            for patient in patients {
                if patient.name.as_str().to_lowercase().contains(&needle)
                    || patient.id.to_lowercase().contains(&needle)
                {
                    println!("{}", render::patient_line(&patient));
                    any = true;
                }
            }
            if !any {
                println!("No patients match '{args}'.");
            }
            Ok(())
        }
        "admit" => {
            let patient = hospital.admit_patient(args).map_err(|e| render::describe(&e))?;
            println!("{}", render::patient_line(&patient));
            Ok(())
        }
        "discharge" => {
            let patient = hospital
                .discharge_patient(args)
                .map_err(|e| render::describe(&e))?;
            println!("{}", render::patient_line(&patient));
            Ok(())
        }
        "delete" => {
            if !confirm(&format!("Delete patient {args}?")) {
                println!("Kept {args}.");
                return Ok(());
            }
            if hospital.delete_patient(args).map_err(|e| render::describe(&e))? {
                println!("Deleted {args}.");
            } else {
                println!("No patient with id {args} exists.");
            }
            Ok(())
        }
        _ => Err("Usage: patient add|list|show|find|admit|discharge|delete".into()),
    }
}

fn appointment_cmd(hospital: &Hospital, rest: &str) -> Result<(), String> {
    let (verb, args) = split_first(rest);
    match verb {
        "add" => {
            let parts: Vec<&str> = args.splitn(4, char::is_whitespace).collect();
            let [patient_id, date, time, kind] = parts.as_slice() else {
                return Err("Usage: appt add <patient> <yyyy-mm-dd> <hh:mm> <kind>".into());
            };
            let appointment = hospital
                .schedule_appointment(NewAppointment {
                    patient_id: (*patient_id).to_owned(),
                    scheduled_for: parse_datetime(date, time)?,
                    kind: parse_text(kind, "appointment kind")?,
                })
                .map_err(|e| render::describe(&e))?;
            println!("Scheduled {}", render::appointment_line(&appointment));
            Ok(())
        }
        "list" => {
            let appointments = hospital
                .list_appointments()
                .map_err(|e| render::describe(&e))?;
            if appointments.is_empty() {
                println!("No appointments scheduled.");
            }
            for appointment in appointments {
                println!("{}", render::appointment_line(&appointment));
            }
            Ok(())
        }
        "show" => {
            match hospital
                .find_appointment(args)
                .map_err(|e| render::describe(&e))?
            {
                Some(appointment) => println!("{}", render::appointment_line(&appointment)),
                None => println!("No appointment with id {args} exists."),
            }
            Ok(())
        }
        "move" => {
            let parts: Vec<&str> = args.splitn(4, char::is_whitespace).collect();
            let [id, date, time, kind] = parts.as_slice() else {
                return Err("Usage: appt move <id> <yyyy-mm-dd> <hh:mm> <kind>".into());
            };
            let appointment = hospital
                .update_appointment(
                    id,
                    AppointmentChange {
                        scheduled_for: parse_datetime(date, time)?,
                        kind: parse_text(kind, "appointment kind")?,
                    },
                )
                .map_err(|e| render::describe(&e))?;
            println!("Rebooked {}", render::appointment_line(&appointment));
            Ok(())
        }
        "complete" => {
            let appointment = hospital
                .complete_appointment(args)
                .map_err(|e| render::describe(&e))?;
            println!("{}", render::appointment_line(&appointment));
            Ok(())
        }
        "cancel" => {
            let appointment = hospital
                .cancel_appointment(args)
                .map_err(|e| render::describe(&e))?;
            println!("{}", render::appointment_line(&appointment));
            Ok(())
        }
        "delete" => {
            if !confirm(&format!("Delete appointment {args}?")) {
                println!("Kept {args}.");
                return Ok(());
            }
            if hospital
                .delete_appointment(args)
                .map_err(|e| render::describe(&e))?
            {
                println!("Deleted {args}.");
            } else {
                println!("No appointment with id {args} exists.");
            }
            Ok(())
        }
        _ => Err("Usage: appt add|list|show|move|complete|cancel|delete".into()),
    }
}

fn record_cmd(hospital: &Hospital, rest: &str) -> Result<(), String> {
    let (verb, args) = split_first(rest);
    match verb {
        "add" => {
            let parts: Vec<&str> = args.splitn(4, char::is_whitespace).collect();
            let [patient_id, appointment_id, date, diagnosis] = parts.as_slice() else {
                return Err("Usage: record add <patient> <appt> <yyyy-mm-dd> <diagnosis>".into());
            };
            let record = hospital
                .add_medical_record(NewMedicalRecord {
                    patient_id: (*patient_id).to_owned(),
                    appointment_id: (*appointment_id).to_owned(),
                    diagnosis: parse_text(diagnosis, "diagnosis")?,
                    notes: String::new(),
                    recorded_on: parse_date(date)?,
                })
                .map_err(|e| render::describe(&e))?;
            println!("Added {}", render::record_line(&record));
            Ok(())
        }
        "note" => {
            let (id, notes) = split_first(args);
            let current = hospital
                .find_medical_record(id)
                .map_err(|e| render::describe(&e))?
                .ok_or(format!("No medical record with id {id} exists."))?;
            let record = hospital
                .update_medical_record(
                    id,
                    MedicalRecordChange {
                        diagnosis: current.diagnosis,
                        notes: notes.to_owned(),
                    },
                )
                .map_err(|e| render::describe(&e))?;
            println!("Updated {}", render::record_line(&record));
            Ok(())
        }
        "list" => {
            let records = hospital
                .list_medical_records()
                .map_err(|e| render::describe(&e))?;
            if records.is_empty() {
                println!("No medical records.");
            }
            for record in records {
                println!("{}", render::record_line(&record));
            }
            Ok(())
        }
        "show" => {
            match hospital
                .find_medical_record(args)
                .map_err(|e| render::describe(&e))?
            {
                Some(record) => println!("{}", render::record_line(&record)),
                None => println!("No medical record with id {args} exists."),
            }
            Ok(())
        }
        "delete" => {
            if !confirm(&format!("Delete medical record {args}?")) {
                println!("Kept {args}.");
                return Ok(());
            }
            if hospital
                .delete_medical_record(args)
                .map_err(|e| render::describe(&e))?
            {
                println!("Deleted {args}.");
            } else {
                println!("No medical record with id {args} exists.");
            }
            Ok(())
        }
        _ => Err("Usage: record add|note|list|show|delete".into()),
    }
}

fn bill_cmd(hospital: &Hospital, rest: &str) -> Result<(), String> {
    let (verb, args) = split_first(rest);
    match verb {
        "create" => {
            let bill = hospital.create_bill(args).map_err(|e| render::describe(&e))?;
            println!("Created {}", render::bill_line(&bill));
            Ok(())
        }
        "item" => {
            let parts: Vec<&str> = args.splitn(3, char::is_whitespace).collect();
            let [bill_id, amount, description] = parts.as_slice() else {
                return Err("Usage: bill item <id> <amount> <description>".into());
            };
            let item = LineItem::new(
                parse_text(description, "line item description")?,
                parse_money(amount)?,
            )
            .map_err(|e| render::describe(&e))?;
            let bill = hospital
                .add_line_item(bill_id, item)
                .map_err(|e| render::describe(&e))?;
            println!("{}", render::bill_line(&bill));
            Ok(())
        }
        "pay" => {
            let (bill_id, reference) = split_first(args);
            let bill = hospital
                .mark_bill_paid(bill_id, reference)
                .map_err(|e| render::describe(&e))?;
            println!("Settled {}", render::bill_line(&bill));
            Ok(())
        }
        "list" => {
            let bills = hospital.list_bills().map_err(|e| render::describe(&e))?;
            if bills.is_empty() {
                println!("No bills.");
            }
            for bill in bills {
                println!("{}", render::bill_line(&bill));
            }
            Ok(())
        }
        "show" => {
            match hospital.find_bill(args).map_err(|e| render::describe(&e))? {
                Some(bill) => {
                    println!("{}", render::bill_line(&bill));
                    for item in &bill.line_items {
                        println!("  {}  {}", item.amount(), item.description());
                    }
                }
                None => println!("No bill with id {args} exists."),
            }
            Ok(())
        }
        "delete" => {
            if !confirm(&format!("Delete bill {args}?")) {
                println!("Kept {args}.");
                return Ok(());
            }
            if hospital.delete_bill(args).map_err(|e| render::describe(&e))? {
                println!("Deleted {args}.");
            } else {
                println!("No bill with id {args} exists.");
            }
            Ok(())
        }
        _ => Err("Usage: bill create|item|pay|list|show|delete".into()),
    }
}

fn stock_cmd(hospital: &Hospital, rest: &str) -> Result<(), String> {
    let (verb, args) = split_first(rest);
    match verb {
        "add" => {
            let parts: Vec<&str> = args.splitn(3, char::is_whitespace).collect();
            let [quantity, price, name] = parts.as_slice() else {
                return Err("Usage: stock add <quantity> <unit-price> <name>".into());
            };
            let item = hospital
                .add_inventory_item(NewInventoryItem {
                    name: parse_text(name, "item name")?,
                    quantity: parse_count(quantity)?,
                    unit_price: parse_money(price)?,
                })
                .map_err(|e| render::describe(&e))?;
            println!("Added {}", render::item_line(&item));
            Ok(())
        }
        "in" | "out" => {
            let (id, amount) = split_first(args);
            let amount = parse_count(amount)?;
            let item = if verb == "in" {
                hospital.add_stock(id, amount)
            } else {
                hospital.remove_stock(id, amount)
            }
            .map_err(|e| render::describe(&e))?;
            println!("{}", render::item_line(&item));
            Ok(())
        }
        "price" => {
            let (id, price) = split_first(args);
            let current = hospital
                .find_inventory_item(id)
                .map_err(|e| render::describe(&e))?
                .ok_or(format!("No inventory item with id {id} exists."))?;
            let item = hospital
                .update_inventory_item(
                    id,
                    InventoryItemChange {
                        name: current.name,
                        unit_price: parse_money(price)?,
                    },
                )
                .map_err(|e| render::describe(&e))?;
            println!("{}", render::item_line(&item));
            Ok(())
        }
        "list" => {
            let items = hospital
                .list_inventory_items()
                .map_err(|e| render::describe(&e))?;
            if items.is_empty() {
                println!("No inventory items.");
            }
            for item in items {
                println!("{}", render::item_line(&item));
            }
            Ok(())
        }
        "delete" => {
            if !confirm(&format!("Delete inventory item {args}?")) {
                println!("Kept {args}.");
                return Ok(());
            }
            if hospital
                .delete_inventory_item(args)
                .map_err(|e| render::describe(&e))?
            {
                println!("Deleted {args}.");
            } else {
                println!("No inventory item with id {args} exists.");
            }
            Ok(())
        }
        _ => Err("Usage: stock add|in|out|price|list|delete".into()),
    }
}

fn export_cmd(hospital: &Hospital, role: Role, what: &str) -> Result<(), String> {
    let json = match what {
        "patients" => serde_json::to_string_pretty(
            &hospital.list_patients().map_err(|e| render::describe(&e))?,
        ),
        "appointments" => serde_json::to_string_pretty(
            &hospital
                .list_appointments()
                .map_err(|e| render::describe(&e))?,
        ),
        "records" => serde_json::to_string_pretty(
            &hospital
                .list_medical_records()
                .map_err(|e| render::describe(&e))?,
        ),
        "bills" => {
            admin_only(role, "billing")?;
            serde_json::to_string_pretty(&hospital.list_bills().map_err(|e| render::describe(&e))?)
        }
        "inventory" => {
            admin_only(role, "inventory")?;
            serde_json::to_string_pretty(
                &hospital
                    .list_inventory_items()
                    .map_err(|e| render::describe(&e))?,
            )
        }
        _ => {
            return Err(
                "Usage: export <patients|appointments|records|bills|inventory>".into(),
            )
        }
    };
    println!("{}", json.map_err(|e| format!("Export failed: {e}."))?);
    Ok(())
}

/// Scripted tour of the main workflows, mirroring how the wards actually
/// use the system on a first day.
pub fn demo(hospital: &Hospital) -> Result<(), Box<dyn std::error::Error>> {
    use chrono::Duration;

    println!("-- registering a patient");
    let patient = hospital.register_patient(NewPatient {
        name: NonEmptyText::new("Alice")?,
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).ok_or("bad demo date")?,
    })?;
    println!("{}", render::patient_line(&patient));

    println!("-- scheduling and completing a checkup");
    let appointment = hospital.schedule_appointment(NewAppointment {
        patient_id: patient.id.clone(),
        scheduled_for: Utc::now() + Duration::hours(2),
        kind: NonEmptyText::new("Checkup")?,
    })?;
    let appointment = hospital.complete_appointment(&appointment.id)?;
    println!("{}", render::appointment_line(&appointment));
    match hospital.cancel_appointment(&appointment.id) {
        Ok(_) => println!("unexpected: completed appointment was cancelled"),
        Err(e) => println!("cancel afterwards: {}", render::describe(&e)),
    }

    println!("-- filing the diagnosis");
    let record = hospital.add_medical_record(NewMedicalRecord {
        patient_id: patient.id.clone(),
        appointment_id: appointment.id,
        diagnosis: NonEmptyText::new("Healthy")?,
        notes: "Routine checkup, no findings".into(),
        recorded_on: Utc::now().date_naive(),
    })?;
    println!("{}", render::record_line(&record));

    println!("-- billing the visit");
    let bill = hospital.create_bill(&patient.id)?;
    let bill = hospital.add_line_item(
        &bill.id,
        LineItem::new(NonEmptyText::new("X-ray")?, "150.00".parse::<Money>()?)?,
    )?;
    println!("total before payment: {}", bill.total());
    let bill = hospital.mark_bill_paid(&bill.id, "REF1")?;
    println!("{}", render::bill_line(&bill));

    println!("-- stocking the supply room");
    let item = hospital.add_inventory_item(NewInventoryItem {
        name: NonEmptyText::new("Gauze")?,
        quantity: 10,
        unit_price: "2.50".parse::<Money>()?,
    })?;
    match hospital.remove_stock(&item.id, 15) {
        Ok(_) => println!("unexpected: overdraw succeeded"),
        Err(e) => println!("overdraw attempt: {}", render::describe(&e)),
    }
    let item = hospital.remove_stock(&item.id, 10)?;
    println!("{}", render::item_line(&item));

    Ok(())
}
