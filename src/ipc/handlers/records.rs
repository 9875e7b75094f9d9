use crate::ipc::error::{err, ok, store_err};
use crate::ipc::helpers::{db_store, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::record::{value_text, StudentForm, GENDER_CHOICES, PROGRAM_CHOICES, SEMESTER_CHOICES};
use crate::store::RecordStore;
use serde_json::json;

fn handle_records_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let AppState { store, roster, .. } = state;
    let Some(store) = store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    // On failure the dashboard keeps showing what it had.
    if let Err(e) = roster.refresh(store) {
        return store_err(&req.id, "failed to load student records", &e);
    }
    ok(&req.id, json!({ "records": roster.records() }))
}

/// Applies `params.fields` on top of the form defaults.
fn form_from_params(req: &Request, email: Option<&str>) -> Result<StudentForm, serde_json::Value> {
    let mut form = StudentForm::new(email);
    match req.params.get("fields") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(map)) => {
            for (name, value) in map {
                form = form.with_field(name, value_text(value));
            }
        }
        Some(_) => {
            return Err(err(&req.id, "bad_params", "fields must be an object", None));
        }
    }
    Ok(form)
}

fn handle_records_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user_id = match required_str(req, "userId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let form = match form_from_params(req, optional_str(req, "email").as_deref()) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let store = match db_store(state, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match store.create_record(&user_id, &form) {
        Ok(record) => {
            let resp = ok(&req.id, json!({ "record": &record }));
            state.roster.push_newest(record);
            resp
        }
        Err(e) => {
            log::error!("error submitting form for {}: {}", user_id, e);
            store_err(&req.id, "failed to submit form, please try again", &e)
        }
    }
}

fn handle_records_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let AppState { store, roster, .. } = state;
    let Some(store) = store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match roster.delete(store, &id) {
        Ok(()) => ok(
            &req.id,
            json!({ "deletedId": id, "remaining": roster.records().len() }),
        ),
        Err(e) => store_err(&req.id, "failed to delete record", &e),
    }
}

fn handle_form_defaults(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let email = optional_str(req, "email");
    let form = StudentForm::new(email.as_deref());
    ok(&req.id, json!({ "fields": form.fields() }))
}

fn handle_form_options(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "programs": PROGRAM_CHOICES,
            "genders": GENDER_CHOICES,
            "semesters": SEMESTER_CHOICES,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.list" => Some(handle_records_list(state, req)),
        "records.submit" => Some(handle_records_submit(state, req)),
        "records.delete" => Some(handle_records_delete(state, req)),
        "form.defaults" => Some(handle_form_defaults(state, req)),
        "form.options" => Some(handle_form_options(state, req)),
        _ => None,
    }
}
