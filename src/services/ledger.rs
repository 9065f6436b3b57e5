// src/services/ledger.rs
//
// Owns the canonical departments, employees and expenses for the session.
// Every mutation is applied to local state first; the matching mirror write
// (remote document store, or local snapshot) runs afterwards in the background.

use crate::{
    errors::{AppError, AppResult},
    models::{
        Allocation, AllocationInput, ContactFields, CreateDepartmentRequest,
        CreateEmployeeRequest, CreateExpenseRequest, Department, DocumentRecord, DocumentStatus,
        Employee, EmployeeQuery, EmployeeStatus, Expense, ExpenseCategory, ExpenseQuery,
        LedgerSnapshot, NewDocument, PaymentReceipt, Payout, PayoutStatus, PayoutType,
        PayrollSuggestion, RecordPaymentRequest, RosterEntry, RunPayrollRequest,
        UpdateDepartmentRequest, UpdateEmployeeRequest,
    },
    seed,
    services::{
        budget::{self, BudgetOverview, DepartmentSummary, Period, TrendPoint},
        directory,
    },
    store::{
        Collection, Document, Record, RemoteStore, StoreError, snapshot::SnapshotStore,
        to_document,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Remote,
    Local,
}

/// Mirror write owed for a local mutation.
#[derive(Debug)]
enum Change {
    Create {
        collection: Collection,
        temp_id: String,
        body: Document,
    },
    Update {
        collection: Collection,
        id: String,
        fields: Document,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

impl Change {
    fn create<T: Record>(record: &T) -> AppResult<Self> {
        Ok(Change::Create {
            collection: T::COLLECTION,
            temp_id: record.id().to_string(),
            body: to_document(record)?,
        })
    }

    fn update<P: Serialize>(collection: Collection, id: &str, fields: &P) -> AppResult<Self> {
        Ok(Change::Update {
            collection,
            id: id.to_string(),
            fields: to_document(fields)?,
        })
    }

    fn delete(collection: Collection, id: String) -> Self {
        Change::Delete { collection, id }
    }
}

/// Fields sent to the store when an employee changes. Absent fields are untouched.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_annual_salary: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocations: Option<Vec<Allocation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<EmployeeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    termination_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact: Option<ContactFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents: Option<Vec<DocumentRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payouts: Option<Vec<Payout>>,
}

impl EmployeePatch {
    fn departments(employee: &Employee) -> Self {
        Self {
            primary_department: Some(employee.primary_department.clone()),
            allocations: Some(employee.allocations.clone()),
            ..Default::default()
        }
    }

    fn termination(employee: &Employee) -> Self {
        Self {
            status: Some(employee.status),
            termination_date: employee.termination_date,
            ..Default::default()
        }
    }
}

/// Issues temporary identifiers: creation time in milliseconds plus a
/// process-wide sequence so two creations in the same millisecond differ.
#[derive(Default)]
struct TempIds {
    seq: AtomicU64,
}

impl TempIds {
    fn next(&self, prefix: &str) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}{}-{}", prefix, Utc::now().timestamp_millis(), seq)
    }
}

#[derive(Default)]
struct LedgerState {
    data: LedgerSnapshot,
    /// Temporary identifier -> store-assigned identifier
    reconciled: HashMap<String, String>,
}

impl LedgerState {
    /// Maps a temporary identifier to its store-assigned replacement, if any.
    fn resolve(&self, id: &str) -> String {
        self.reconciled
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn reconcile(&mut self, collection: Collection, temp_id: &str, real_id: &str) -> bool {
        self.reconciled
            .insert(temp_id.to_string(), real_id.to_string());
        match collection {
            Collection::Departments => replace_id(&mut self.data.departments, temp_id, real_id),
            Collection::Employees => replace_id(&mut self.data.employees, temp_id, real_id),
            Collection::Expenses => replace_id(&mut self.data.expenses, temp_id, real_id),
        }
    }

    fn employee_index(&self, id: &str) -> AppResult<usize> {
        self.data
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
    }

    fn department_index(&self, name: &str) -> AppResult<usize> {
        self.data
            .departments
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| AppError::NotFound(format!("Department '{}' not found", name)))
    }
}

/// Replaces only the identifier of the record holding `temp_id`.
fn replace_id<T: Record>(records: &mut [T], temp_id: &str, real_id: &str) -> bool {
    match records.iter_mut().find(|r| r.id() == temp_id) {
        Some(record) => {
            record.set_id(real_id.to_string());
            true
        }
        None => false,
    }
}

/// Coalescing snapshot writer for local mode.
struct SnapshotWriter {
    store: SnapshotStore,
    dirty: AtomicBool,
    write_lock: Mutex<()>,
}

impl SnapshotWriter {
    fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            dirty: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns true when no write was pending yet.
    fn mark_dirty(&self) -> bool {
        !self.dirty.swap(true, Ordering::SeqCst)
    }

    /// Writes the current state if anything changed since the last write.
    /// Writes are serialized, so an older state never lands after a newer one.
    async fn flush(&self, state: &RwLock<LedgerState>) {
        let _guard = self.write_lock.lock().await;
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let snapshot = state.read().await.data.clone();
        match self.store.save(&snapshot).await {
            Ok(()) => debug!("Local snapshot written"),
            Err(e) => error!("Failed to write local snapshot: {}", e),
        }
    }
}

/// A group of mirror writes handed to the remote queue together.
struct Batch {
    changes: Vec<Change>,
    done: Option<oneshot::Sender<()>>,
}

/// Where mirror writes go, chosen once at start-up.
enum Mirror {
    /// Single FIFO worker, so a create always lands before later writes that
    /// address the same record.
    Remote(mpsc::UnboundedSender<Batch>),
    Local(SnapshotWriter),
}

struct Inner {
    state: RwLock<LedgerState>,
    mirror: Mirror,
    ids: TempIds,
    inflight: watch::Sender<usize>,
}

impl Inner {
    async fn flush_snapshot(&self) {
        if let Mirror::Local(writer) = &self.mirror {
            writer.flush(&self.state).await;
        }
    }

    async fn mirror_change(&self, store: &RemoteStore, change: Change) {
        match change {
            Change::Create {
                collection,
                temp_id,
                body,
            } => match store.create(collection, body).await {
                Ok(real_id) => {
                    let found = self
                        .state
                        .write()
                        .await
                        .reconcile(collection, &temp_id, &real_id);
                    if found {
                        debug!("Reconciled {}/{} -> {}", collection, temp_id, real_id);
                    } else {
                        // Deleted locally while the create was in flight.
                        info!("Removing orphaned {}/{}", collection, real_id);
                        if let Err(e) = store.delete(collection, &real_id).await {
                            warn!("Failed to remove orphaned {}/{}: {}", collection, real_id, e);
                        }
                    }
                }
                Err(e) => warn!(
                    "Create {}/{} not mirrored, keeping temporary id: {}",
                    collection, temp_id, e
                ),
            },
            Change::Update {
                collection,
                id,
                fields,
            } => {
                let id = self.state.read().await.resolve(&id);
                if let Err(e) = store.update(collection, &id, fields).await {
                    warn!("Update {}/{} not mirrored: {}", collection, id, e);
                }
            }
            Change::Delete { collection, id } => {
                let id = self.state.read().await.resolve(&id);
                if let Err(e) = store.delete(collection, &id).await {
                    warn!("Delete {}/{} not mirrored: {}", collection, id, e);
                }
            }
        }
    }
}

/// Drains the remote queue one change at a time, carrying on past failures.
/// Exits once the owning ledger is dropped.
async fn mirror_worker(
    ledger: Weak<Inner>,
    store: RemoteStore,
    mut queue: mpsc::UnboundedReceiver<Batch>,
) {
    while let Some(batch) = queue.recv().await {
        let Some(inner) = ledger.upgrade() else {
            break;
        };
        for change in batch.changes {
            inner.mirror_change(&store, change).await;
        }
        inner.inflight.send_modify(|n| *n -= 1);
        if let Some(done) = batch.done {
            let _ = done.send(());
        }
    }
    debug!("Mirror queue closed");
}

#[derive(Clone)]
pub struct Ledger {
    inner: Arc<Inner>,
}

impl Ledger {
    /// Tries the remote store (prepare, seed, load). Any failure, or a store
    /// that is not configured, switches to local mode for the whole session.
    pub async fn bootstrap(remote: RemoteStore, snapshots: SnapshotStore) -> Self {
        if remote.is_configured() {
            match load_remote(&remote).await {
                Ok(data) => {
                    info!(
                        "Remote document store ready: {} departments, {} employees, {} expenses",
                        data.departments.len(),
                        data.employees.len(),
                        data.expenses.len()
                    );
                    return Self::remote(data, remote);
                }
                Err(e) => warn!("Remote document store unavailable, using local mode: {}", e),
            }
        } else {
            info!("No document store configured, using local mode");
        }

        let data = snapshots.load_or_default().await;
        Self::new(data, Mirror::Local(SnapshotWriter::new(snapshots)))
    }

    fn remote(data: LedgerSnapshot, store: RemoteStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let ledger = Self::new(data, Mirror::Remote(tx));
        tokio::spawn(mirror_worker(Arc::downgrade(&ledger.inner), store, rx));
        ledger
    }

    fn new(data: LedgerSnapshot, mirror: Mirror) -> Self {
        let (inflight, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(LedgerState {
                    data,
                    reconciled: HashMap::new(),
                }),
                mirror,
                ids: TempIds::default(),
                inflight,
            }),
        }
    }

    pub fn mode(&self) -> SyncMode {
        match self.inner.mirror {
            Mirror::Remote(_) => SyncMode::Remote,
            Mirror::Local(_) => SyncMode::Local,
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&LedgerSnapshot) -> R) -> R {
        let state = self.inner.state.read().await;
        f(&state.data)
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.read(|data| data.clone()).await
    }

    /// Waits until every background mirror write has finished.
    pub async fn settle(&self) {
        let mut rx = self.inner.inflight.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    // ─── Mutation plumbing ────────────────────────────────────────────────────

    /// Applies `f` to local state and queues its mirror writes before the
    /// state lock is released, so mirror order always matches local order.
    /// The flag is true when `done` will be signalled.
    async fn apply<R>(
        &self,
        f: impl FnOnce(&mut LedgerState, &TempIds) -> AppResult<(R, Vec<Change>)>,
        done: Option<oneshot::Sender<()>>,
    ) -> AppResult<(R, bool)> {
        let mut state = self.inner.state.write().await;
        let (result, changes) = f(&mut state, &self.inner.ids)?;
        let signalled = self.dispatch(changes, done);
        Ok((result, signalled))
    }

    /// Applies `f` to local state, then mirrors its changes in the background.
    async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut LedgerState, &TempIds) -> AppResult<(R, Vec<Change>)>,
    ) -> AppResult<R> {
        let (result, _) = self.apply(f, None).await?;
        Ok(result)
    }

    /// Like `mutate`, but returns only once the changes are mirrored.
    async fn mutate_and_wait<R>(
        &self,
        f: impl FnOnce(&mut LedgerState, &TempIds) -> AppResult<(R, Vec<Change>)>,
    ) -> AppResult<R> {
        let (done, finished) = oneshot::channel();
        let (result, signalled) = self.apply(f, Some(done)).await?;
        if signalled {
            let _ = finished.await;
        }
        Ok(result)
    }

    /// Returns true when `done` will be signalled.
    fn dispatch(&self, changes: Vec<Change>, done: Option<oneshot::Sender<()>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        match &self.inner.mirror {
            Mirror::Remote(queue) => {
                self.inner.inflight.send_modify(|n| *n += 1);
                if queue.send(Batch { changes, done }).is_err() {
                    self.inner.inflight.send_modify(|n| *n -= 1);
                    error!("Mirror queue closed, changes kept locally only");
                    return false;
                }
                true
            }
            Mirror::Local(writer) => {
                let first = writer.mark_dirty();
                if let Some(done) = done {
                    let inner = self.inner.clone();
                    tokio::spawn(async move {
                        inner.flush_snapshot().await;
                        let _ = done.send(());
                    });
                    return true;
                }
                if first {
                    self.inner.inflight.send_modify(|n| *n += 1);
                    let inner = self.inner.clone();
                    tokio::spawn(async move {
                        inner.flush_snapshot().await;
                        inner.inflight.send_modify(|n| *n -= 1);
                    });
                }
                // Otherwise a pending write will pick this state up.
                false
            }
        }
    }

    // ─── Departments ──────────────────────────────────────────────────────────

    pub async fn departments(&self) -> Vec<Department> {
        self.read(|data| data.departments.clone()).await
    }

    pub async fn add_department(&self, req: CreateDepartmentRequest) -> AppResult<Department> {
        self.mutate(|state, ids| {
            let name = require(&req.name, "Department name")?;
            require_non_negative(req.monthly_budget, "Monthly budget")?;
            if state.data.departments.iter().any(|d| same_name(&d.name, &name)) {
                return Err(AppError::Conflict(format!(
                    "Department '{}' already exists",
                    name
                )));
            }

            let department = Department {
                id: ids.next("dept-"),
                name,
                monthly_budget: req.monthly_budget,
            };
            let change = Change::create(&department)?;
            state.data.departments.push(department.clone());
            Ok((department, vec![change]))
        })
        .await
    }

    /// Renames and re-budgets a department. A rename rewrites every employee
    /// reference (primary department and allocations) in the same step.
    pub async fn update_department(
        &self,
        current_name: &str,
        req: UpdateDepartmentRequest,
    ) -> AppResult<Department> {
        self.mutate(|state, _| {
            let new_name = require(&req.name, "Department name")?;
            require_non_negative(req.monthly_budget, "Monthly budget")?;
            let idx = state.department_index(current_name)?;

            if !same_name(current_name, &new_name)
                && state
                    .data
                    .departments
                    .iter()
                    .any(|d| same_name(&d.name, &new_name))
            {
                return Err(AppError::Conflict(format!(
                    "Department '{}' already exists",
                    new_name
                )));
            }

            let mut department = state.data.departments[idx].clone();
            department.name = new_name.clone();
            department.monthly_budget = req.monthly_budget;
            let mut changes = vec![Change::update(
                Collection::Departments,
                &department.id,
                &department,
            )?];

            let mut cascaded = Vec::new();
            if current_name != new_name {
                for (i, employee) in state.data.employees.iter().enumerate() {
                    if !employee.references(current_name) {
                        continue;
                    }
                    let mut updated = employee.clone();
                    rename_references(&mut updated, current_name, &new_name);
                    changes.push(Change::update(
                        Collection::Employees,
                        &updated.id,
                        &EmployeePatch::departments(&updated),
                    )?);
                    cascaded.push((i, updated));
                }
            }

            if !cascaded.is_empty() {
                info!(
                    "Renamed department '{}' to '{}' ({} employees updated)",
                    current_name,
                    new_name,
                    cascaded.len()
                );
            }
            state.data.departments[idx] = department.clone();
            for (i, employee) in cascaded {
                state.data.employees[i] = employee;
            }
            Ok((department, changes))
        })
        .await
    }

    /// Rejected while any active employee references the department.
    pub async fn delete_department(&self, name: &str) -> AppResult<()> {
        self.mutate(|state, _| {
            let idx = state.department_index(name)?;
            if state
                .data
                .employees
                .iter()
                .any(|e| e.is_active() && e.references(name))
            {
                return Err(AppError::Conflict(format!(
                    "Department '{}' is still assigned to active employees",
                    name
                )));
            }
            let department = state.data.departments.remove(idx);
            Ok(((), vec![Change::delete(Collection::Departments, department.id)]))
        })
        .await
    }

    // ─── Employees ────────────────────────────────────────────────────────────

    pub async fn employees(&self, query: &EmployeeQuery) -> Vec<Employee> {
        self.read(|data| directory::filter_employees(&data.employees, query))
            .await
    }

    pub async fn employee(&self, id: &str) -> AppResult<Employee> {
        let state = self.inner.state.read().await;
        let idx = state.employee_index(&state.resolve(id))?;
        Ok(state.data.employees[idx].clone())
    }

    pub async fn add_employee(&self, req: CreateEmployeeRequest) -> AppResult<Employee> {
        self.mutate(|state, ids| {
            let name = require(&req.name, "Name")?;
            let role = require(&req.role, "Role")?;
            let allocations = build_allocations(&state.data.departments, &req.allocations)?;
            let documents = req
                .documents
                .iter()
                .map(new_document)
                .collect::<AppResult<Vec<_>>>()?;

            let mut employee = Employee {
                id: ids.next("emp-"),
                name,
                role,
                primary_department: String::new(),
                total_annual_salary: Decimal::ZERO,
                allocations: Vec::new(),
                status: EmployeeStatus::Active,
                termination_date: None,
                start_date: Some(req.start_date),
                documents,
                payouts: Vec::new(),
                contact: req.contact,
            };
            set_allocations(&mut employee, allocations);

            let change = Change::create(&employee)?;
            state.data.employees.push(employee.clone());
            Ok((employee, vec![change]))
        })
        .await
    }

    /// Partial update of an active employee. New documents are appended.
    pub async fn update_employee(
        &self,
        id: &str,
        req: UpdateEmployeeRequest,
    ) -> AppResult<Employee> {
        self.mutate(|state, _| {
            let idx = state.employee_index(&state.resolve(id))?;
            let current = &state.data.employees[idx];
            if !current.is_active() {
                return Err(AppError::Conflict(format!(
                    "Employee {} is terminated; only the termination date can change",
                    current.id
                )));
            }

            let mut updated = current.clone();
            let mut patch = EmployeePatch::default();

            if let Some(name) = &req.name {
                updated.name = require(name, "Name")?;
                patch.name = Some(updated.name.clone());
            }
            if let Some(role) = &req.role {
                updated.role = require(role, "Role")?;
                patch.role = Some(updated.role.clone());
            }
            if let Some(start_date) = req.start_date {
                updated.start_date = Some(start_date);
                patch.start_date = Some(start_date);
            }
            if let Some(inputs) = &req.allocations {
                let allocations = build_allocations(&state.data.departments, inputs)?;
                set_allocations(&mut updated, allocations);
                patch.primary_department = Some(updated.primary_department.clone());
                patch.total_annual_salary = Some(updated.total_annual_salary);
                patch.allocations = Some(updated.allocations.clone());
            }
            if let Some(contact) = req.contact {
                updated.contact = contact.clone();
                patch.contact = Some(contact);
            }
            if !req.new_documents.is_empty() {
                for doc in &req.new_documents {
                    updated.documents.push(new_document(doc)?);
                }
                patch.documents = Some(updated.documents.clone());
            }

            let change = Change::update(Collection::Employees, &updated.id, &patch)?;
            state.data.employees[idx] = updated.clone();
            Ok((updated, vec![change]))
        })
        .await
    }

    pub async fn terminate_employee(&self, id: &str, date: NaiveDate) -> AppResult<Employee> {
        self.mutate(|state, _| {
            let idx = state.employee_index(&state.resolve(id))?;
            let mut updated = state.data.employees[idx].clone();
            updated.status = EmployeeStatus::Terminated;
            updated.termination_date = Some(date);

            let change = Change::update(
                Collection::Employees,
                &updated.id,
                &EmployeePatch::termination(&updated),
            )?;
            state.data.employees[idx] = updated.clone();
            Ok((updated, vec![change]))
        })
        .await
    }

    /// Terminates every known employee in `ids`; unknown identifiers are skipped.
    pub async fn terminate_employees(
        &self,
        ids: &[String],
        date: NaiveDate,
    ) -> AppResult<Vec<Employee>> {
        self.mutate(|state, _| {
            let mut terminated = Vec::new();
            let mut changes = Vec::new();
            for id in ids {
                let Ok(idx) = state.employee_index(&state.resolve(id)) else {
                    debug!("Skipping unknown employee {} in bulk termination", id);
                    continue;
                };
                let mut updated = state.data.employees[idx].clone();
                updated.status = EmployeeStatus::Terminated;
                updated.termination_date = Some(date);
                changes.push(Change::update(
                    Collection::Employees,
                    &updated.id,
                    &EmployeePatch::termination(&updated),
                )?);
                terminated.push((idx, updated));
            }

            let employees: Vec<Employee> = terminated
                .into_iter()
                .map(|(idx, employee)| {
                    state.data.employees[idx] = employee.clone();
                    employee
                })
                .collect();
            Ok((employees, changes))
        })
        .await
    }

    pub async fn delete_employee(&self, id: &str) -> AppResult<()> {
        self.mutate(|state, _| {
            let idx = state.employee_index(&state.resolve(id))?;
            let employee = state.data.employees.remove(idx);
            Ok(((), vec![Change::delete(Collection::Employees, employee.id)]))
        })
        .await
    }

    // ─── Payments ─────────────────────────────────────────────────────────────

    /// Appends a payout to the employee and records the paired salary expense
    /// against their primary department.
    pub async fn record_payment(
        &self,
        employee_id: &str,
        req: RecordPaymentRequest,
    ) -> AppResult<PaymentReceipt> {
        self.mutate(|state, ids| {
            apply_payment(state, ids, employee_id, req.amount, req.payout_type, req.date)
        })
        .await
    }

    /// Records each payment in turn, waiting for one pairing's mirror writes
    /// before starting the next. The whole run is validated up front.
    pub async fn run_payroll(&self, req: RunPayrollRequest) -> AppResult<Vec<PaymentReceipt>> {
        if req.payments.is_empty() {
            return Err(AppError::Validation(
                "Select at least one employee to pay".to_string(),
            ));
        }
        {
            let state = self.inner.state.read().await;
            for line in &req.payments {
                require_positive(line.amount, "Payment amount")?;
                let idx = state.employee_index(&state.resolve(&line.employee_id))?;
                if !state.data.employees[idx].is_active() {
                    return Err(AppError::Conflict(format!(
                        "Employee {} is terminated",
                        line.employee_id
                    )));
                }
            }
        }

        let mut receipts = Vec::with_capacity(req.payments.len());
        for line in &req.payments {
            let applied = self
                .mutate_and_wait(|state, ids| {
                    apply_payment(
                        state,
                        ids,
                        &line.employee_id,
                        line.amount,
                        req.payout_type,
                        req.date,
                    )
                })
                .await;
            match applied {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => warn!("Skipping payment for {}: {}", line.employee_id, e),
            }
        }

        info!(
            "Payroll run on {} recorded {} {} payments",
            req.date,
            receipts.len(),
            req.payout_type
        );
        Ok(receipts)
    }

    pub async fn payroll_suggestions(&self) -> Vec<PayrollSuggestion> {
        self.read(|data| directory::payroll_suggestions(&data.employees))
            .await
    }

    // ─── Expenses ─────────────────────────────────────────────────────────────

    pub async fn expenses(&self, query: &ExpenseQuery) -> AppResult<Vec<Expense>> {
        validate_month(query.month)?;
        Ok(self
            .read(|data| directory::filter_expenses(&data.expenses, query))
            .await)
    }

    pub async fn add_expense(&self, req: CreateExpenseRequest) -> AppResult<Expense> {
        self.mutate(|state, ids| {
            let description = require(&req.description, "Description")?;
            require_positive(req.amount, "Amount")?;
            if req.category == ExpenseCategory::Salary {
                return Err(AppError::Validation(
                    "Salary expenses are recorded through payouts".to_string(),
                ));
            }
            let department = req.department.trim();
            if state.data.department(department).is_none() {
                return Err(AppError::Validation(format!(
                    "Unknown department '{}'",
                    department
                )));
            }

            let expense = Expense {
                id: ids.next("exp-"),
                description,
                amount: req.amount,
                department: department.to_string(),
                date: req.date,
                category: req.category,
            };
            let change = Change::create(&expense)?;
            state.data.expenses.push(expense.clone());
            Ok((expense, vec![change]))
        })
        .await
    }

    /// Removes every listed expense; returns how many were found.
    pub async fn delete_expenses(&self, ids: &[String]) -> AppResult<usize> {
        self.mutate(|state, _| {
            let wanted: HashSet<String> = ids.iter().map(|id| state.resolve(id)).collect();
            let mut changes = Vec::new();
            state.data.expenses.retain(|e| {
                if wanted.contains(&e.id) {
                    changes.push(Change::delete(Collection::Expenses, e.id.clone()));
                    false
                } else {
                    true
                }
            });
            Ok((changes.len(), changes))
        })
        .await
    }

    // ─── Aggregation views ────────────────────────────────────────────────────

    pub async fn overview(&self, period: Period) -> AppResult<BudgetOverview> {
        validate_month(period.month)?;
        Ok(self.read(|data| budget::overview(data, period)).await)
    }

    pub async fn department_summary(
        &self,
        name: &str,
        period: Period,
    ) -> AppResult<DepartmentSummary> {
        validate_month(period.month)?;
        self.read(|data| -> AppResult<_> {
            let department = data
                .department(name)
                .ok_or_else(|| AppError::NotFound(format!("Department '{}' not found", name)))?;
            Ok(budget::department_summary(
                department,
                &data.employees,
                &data.expenses,
                period,
            ))
        })
        .await
    }

    pub async fn department_trend(&self, name: &str, year: i32) -> AppResult<Vec<TrendPoint>> {
        self.read(|data| -> AppResult<_> {
            data.department(name)
                .ok_or_else(|| AppError::NotFound(format!("Department '{}' not found", name)))?;
            Ok(budget::monthly_trend(name, &data.expenses, year))
        })
        .await
    }

    pub async fn department_roster(&self, name: &str) -> AppResult<Vec<RosterEntry>> {
        self.read(|data| -> AppResult<_> {
            data.department(name)
                .ok_or_else(|| AppError::NotFound(format!("Department '{}' not found", name)))?;
            Ok(directory::roster(&data.employees, name))
        })
        .await
    }
}

async fn load_remote(remote: &RemoteStore) -> Result<LedgerSnapshot, StoreError> {
    remote.prepare().await?;
    remote.seed(&seed::default_snapshot()).await?;
    let (departments, employees, expenses) = tokio::try_join!(
        remote.list_all::<Department>(),
        remote.list_all::<Employee>(),
        remote.list_all::<Expense>(),
    )?;
    Ok(LedgerSnapshot {
        departments,
        employees,
        expenses,
    })
}

fn apply_payment(
    state: &mut LedgerState,
    ids: &TempIds,
    employee_id: &str,
    amount: Decimal,
    payout_type: PayoutType,
    date: NaiveDate,
) -> AppResult<(PaymentReceipt, Vec<Change>)> {
    require_positive(amount, "Payment amount")?;
    let idx = state.employee_index(&state.resolve(employee_id))?;
    let employee = &state.data.employees[idx];
    if !employee.is_active() {
        return Err(AppError::Conflict(format!(
            "Employee {} is terminated",
            employee.id
        )));
    }

    let payout = Payout {
        id: ids.next("pay-"),
        date,
        amount,
        payout_type,
        status: PayoutStatus::Paid,
    };
    let expense = Expense {
        id: ids.next("exp-"),
        description: format!("{} - {}", payout_type, employee.name),
        amount,
        department: employee.primary_department.clone(),
        date,
        category: ExpenseCategory::Salary,
    };
    let mut payouts = employee.payouts.clone();
    payouts.push(payout.clone());

    let changes = vec![
        Change::update(
            Collection::Employees,
            &employee.id,
            &EmployeePatch {
                payouts: Some(payouts.clone()),
                ..Default::default()
            },
        )?,
        Change::create(&expense)?,
    ];
    let receipt = PaymentReceipt {
        employee_id: employee.id.clone(),
        payout,
        expense: expense.clone(),
    };

    state.data.employees[idx].payouts = payouts;
    state.data.expenses.push(expense);
    Ok((receipt, changes))
}

// ─── Validation helpers ───────────────────────────────────────────────────────

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn require(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn require_positive(amount: Decimal, field: &str) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

fn require_non_negative(amount: Decimal, field: &str) -> AppResult<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::Validation(format!("{} cannot be negative", field)));
    }
    Ok(())
}

fn validate_month(month: Option<u32>) -> AppResult<()> {
    match month {
        Some(m) if !(1..=12).contains(&m) => Err(AppError::Validation(format!(
            "Month must be between 1 and 12, got {}",
            m
        ))),
        _ => Ok(()),
    }
}

fn build_allocations(
    departments: &[Department],
    inputs: &[AllocationInput],
) -> AppResult<Vec<Allocation>> {
    if inputs.is_empty() {
        return Err(AppError::Validation(
            "At least one department allocation is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let department = require(&input.department, "Allocation department")?;
            if !departments.iter().any(|d| d.name == department) {
                return Err(AppError::Validation(format!(
                    "Unknown department '{}'",
                    department
                )));
            }
            if !seen.insert(department.clone()) {
                return Err(AppError::Validation(format!(
                    "Department '{}' is allocated more than once",
                    department
                )));
            }
            require_positive(input.monthly_salary, "Monthly salary")?;
            Ok(Allocation {
                department,
                annual_salary: input.monthly_salary * dec!(12),
            })
        })
        .collect()
}

/// Keeps the total and primary department in step with the allocations.
/// `allocations` must be non-empty.
fn set_allocations(employee: &mut Employee, allocations: Vec<Allocation>) {
    employee.total_annual_salary = allocations.iter().map(|a| a.annual_salary).sum();
    if let Some(first) = allocations.first() {
        employee.primary_department = first.department.clone();
    }
    employee.allocations = allocations;
}

fn rename_references(employee: &mut Employee, from: &str, to: &str) {
    if employee.primary_department == from {
        employee.primary_department = to.to_string();
    }
    for allocation in employee
        .allocations
        .iter_mut()
        .filter(|a| a.department == from)
    {
        allocation.department = to.to_string();
    }
}

fn new_document(doc: &NewDocument) -> AppResult<DocumentRecord> {
    let has_payload = doc.inline_data.as_deref().is_some_and(|d| !d.is_empty())
        || doc.external_url.as_deref().is_some_and(|u| !u.trim().is_empty());
    if !has_payload {
        return Err(AppError::Validation(
            "A document needs either a file or a link".to_string(),
        ));
    }
    Ok(DocumentRecord {
        doc_type: doc.doc_type,
        status: DocumentStatus::Uploaded,
        last_updated: Utc::now().date_naive(),
        file_name: doc.file_name.clone(),
        inline_data: doc.inline_data.clone(),
        external_url: doc.external_url.as_deref().map(|u| u.trim().to_string()),
    })
}
