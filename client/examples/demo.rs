//! Interactive CLI demo of the full ZENITH client lifecycle.
//!
//! Walks through identity generation, dashboard startup against an
//! in-process ledger, login, balance refreshes, and the transfer
//! workflow in all three of its endings: recorded, declined, and
//! rejected before a single byte leaves the machine. The output uses
//! ANSI escape codes for colored, storytelling-style terminal rendering.
//!
//! Run with:
//!   cargo run --example demo --release

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use zenith_client::identity::{
    DevIdentityProvider, MemorySessionStore, Principal, SessionManager, SessionStore,
};
use zenith_client::ledger::{
    LedgerClient, LedgerMethod, LedgerTransport, Reply, TransportError,
};
use zenith_client::token::TokenAmount;
use zenith_client::workflow::{Dashboard, TransferPhase};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    ZENITH CLIENT  --  Token Ledger Lifecycle Demo                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Version 0.1.0  |  Ed25519 + BLAKE3 + CRC-32 principals          {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn balance_row(name: &str, display: &str, color: &str) {
    println!("  {color}{BOLD}{name:<12}{RESET}  {WHITE}{display:>16}{RESET} {DIM}ZTH{RESET}");
}

// ---------------------------------------------------------------------------
// In-process ledger
// ---------------------------------------------------------------------------

const DEMO_FEE: u128 = 10_000;
const DEMO_SUPPLY: u128 = 100_000_000_000_000;

/// A complete token ledger living behind the transport seam. It keeps
/// balances keyed by principal text, charges the published fee on every
/// transfer, and declines overdrafts the way a real ledger would: with a
/// reply, not an error.
struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

struct LedgerState {
    balances: HashMap<String, u128>,
    /// The authenticated caller transfers draw from. A real gateway takes
    /// this from the signed envelope; the demo pins it at login.
    caller: Option<String>,
    next_block: u128,
    calls: u64,
}

impl InMemoryLedger {
    fn new() -> Arc<Self> {
        Arc::new(InMemoryLedger {
            state: Mutex::new(LedgerState {
                balances: HashMap::new(),
                caller: None,
                next_block: 1,
                calls: 0,
            }),
        })
    }

    fn fund(&self, principal: &Principal, amount: u128) {
        self.state
            .lock()
            .balances
            .insert(principal.to_text(), amount);
    }

    fn set_caller(&self, principal: &Principal) {
        self.state.lock().caller = Some(principal.to_text());
    }

    fn balance(&self, principal: &Principal) -> u128 {
        *self
            .state
            .lock()
            .balances
            .get(&principal.to_text())
            .unwrap_or(&0)
    }

    fn calls(&self) -> u64 {
        self.state.lock().calls
    }

    fn execute_transfer(state: &mut LedgerState, args: &Value) -> Value {
        let caller = match state.caller.clone() {
            Some(caller) => caller,
            None => return json!({ "Err": "caller is not authenticated" }),
        };
        let to = args["to"]["owner"].as_str().unwrap_or_default().to_string();
        let amount: u128 = args["amount"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let debit = amount + DEMO_FEE;
        let held = *state.balances.get(&caller).unwrap_or(&0);
        if held < debit {
            return json!({
                "Err": format!("insufficient funds: balance {held}, needed {debit}")
            });
        }

        *state.balances.entry(caller).or_insert(0) -= debit;
        *state.balances.entry(to).or_insert(0) += amount;

        let block = state.next_block;
        state.next_block += 1;
        json!({ "Ok": block.to_string() })
    }
}

#[async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn call(
        &self,
        _ledger: &Principal,
        method: LedgerMethod,
        args: Value,
    ) -> Result<Reply, TransportError> {
        let mut state = self.state.lock();
        state.calls += 1;

        let reply = match method {
            LedgerMethod::TokenName => json!("Zenith Demo Token"),
            LedgerMethod::TokenSymbol => json!("ZTH"),
            LedgerMethod::Decimals => json!(8),
            LedgerMethod::TransferFee => json!(DEMO_FEE.to_string()),
            LedgerMethod::TotalSupply => json!(DEMO_SUPPLY.to_string()),
            LedgerMethod::BalanceOf => {
                let owner = args["owner"].as_str().unwrap_or_default();
                let held = *state.balances.get(owner).unwrap_or(&0);
                json!(held.to_string())
            }
            LedgerMethod::Transfer => Self::execute_transfer(&mut state, &args),
        };

        Ok(Reply::Replied { reply })
    }
}

fn display(units: u128) -> String {
    TokenAmount::new(units).display_decimal(8)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let demo_start = Instant::now();

    banner();

    // -----------------------------------------------------------------------
    // Step 1: Identity Generation
    // -----------------------------------------------------------------------

    section(1, "Self-Authenticating Identity Generation");
    subsection("Generating Ed25519 keypairs and deriving checksummed principals...");

    let t = Instant::now();
    let alice_provider = DevIdentityProvider::generate();
    let bob_provider = DevIdentityProvider::generate();
    timing("keygen x2", t.elapsed());

    let alice = alice_provider.principal();
    let bob = bob_provider.principal();

    println!();
    info("Alice", &alice.to_text());
    info("Bob", &bob.to_text());
    println!();

    // Verify the textual codec round-trips with its checksum intact.
    let recovered = Principal::from_text(&alice.to_text()).unwrap();
    assert_eq!(alice, recovered);
    success("Principals carry a CRC-32 checksum and pass text round-trip verification");

    // -----------------------------------------------------------------------
    // Step 2: Ledger Bootstrap & Dashboard Startup
    // -----------------------------------------------------------------------

    section(2, "Ledger Bootstrap & Dashboard Startup");
    subsection("Funding Alice on an in-process ledger and assembling the dashboard...");

    let ledger_backend = InMemoryLedger::new();
    let initial_balance: u128 = 1_000_000_000; // 10 ZTH
    ledger_backend.fund(&alice, initial_balance);

    let ledger_id: Principal = "ryjl3-tyaaa-aaaaa-aaaba-cai".parse().unwrap();
    let client = LedgerClient::new(
        Arc::clone(&ledger_backend) as Arc<dyn LedgerTransport>,
        ledger_id,
    );
    let session = SessionManager::new(
        Arc::new(alice_provider),
        Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>,
    );
    let dashboard = Dashboard::new(client, session);

    let t = Instant::now();
    dashboard.startup().await;
    timing("startup (5 concurrent metadata queries)", t.elapsed());

    let metadata = dashboard.state().metadata().expect("metadata loaded");
    info("Token", &format!("{} ({})", metadata.name, metadata.symbol));
    info("Decimals", &metadata.decimals.to_string());
    info("Transfer fee", &metadata.display_fee());
    info(
        "Total supply",
        &metadata.display_with_symbol(metadata.total_supply),
    );
    success("Metadata loaded; nobody is signed in yet");

    // -----------------------------------------------------------------------
    // Step 3: Login
    // -----------------------------------------------------------------------

    section(3, "Interactive Login");
    subsection("Authenticating Alice and fetching her opening balance...");

    let t = Instant::now();
    dashboard.login().await.unwrap();
    timing("login + balance refresh", t.elapsed());

    let principal = dashboard.current_principal().expect("authenticated");
    ledger_backend.set_caller(&principal);

    info("Signed in as", &principal.to_text());
    println!();
    println!("  {BOLD}{WHITE}--- Opening Balances ---{RESET}");
    balance_row("Alice", &dashboard.state().display_balance().unwrap(), BLUE);
    balance_row("Bob", &display(ledger_backend.balance(&bob)), GREEN);
    println!();
    success("Session established and balance on screen");

    // -----------------------------------------------------------------------
    // Step 4: A Transfer That Clears
    // -----------------------------------------------------------------------

    section(4, "Transfer: Alice -> Bob (2.5 ZTH)");
    subsection("Scaling the typed amount, validating, submitting, refreshing...");

    let t = Instant::now();
    let block = dashboard
        .submit_transfer(&bob.to_text(), "2.5")
        .await
        .unwrap();
    timing("submit + post-success refresh", t.elapsed());

    info("Recorded at block", &block.to_string());
    assert!(matches!(
        dashboard.transfer_phase(),
        TransferPhase::Succeeded { .. }
    ));
    assert!(dashboard.state().form().is_empty());
    dashboard.acknowledge_transfer();

    println!();
    println!("  {BOLD}{WHITE}--- Balances After the Transfer ---{RESET}");
    balance_row("Alice", &dashboard.state().display_balance().unwrap(), BLUE);
    balance_row("Bob", &display(ledger_backend.balance(&bob)), GREEN);
    println!();
    // 10 - 2.5 - 0.0001 fee = 7.4999
    assert_eq!(dashboard.state().display_balance().unwrap(), "7.49990000");
    success("Transfer recorded, form cleared, balance reconciled");

    // -----------------------------------------------------------------------
    // Step 5: A Transfer the Ledger Declines
    // -----------------------------------------------------------------------

    section(5, "Transfer the Ledger Declines (100 ZTH on a 7.5 ZTH balance)");
    subsection("Submitting an overdraft; the decline is a decision, not an outage...");

    let err = dashboard
        .submit_transfer(&bob.to_text(), "100")
        .await
        .unwrap_err();
    info("Error", &err.to_string());

    match dashboard.transfer_phase() {
        TransferPhase::Failed { reason } => {
            info("Phase", &format!("Failed ({reason})"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    // The form keeps the input so Alice can correct the amount.
    assert_eq!(dashboard.state().form().amount, "100");
    dashboard.acknowledge_transfer();
    success("Decline surfaced with the ledger's reason; input preserved for correction");

    // -----------------------------------------------------------------------
    // Step 6: Input Rejected Before the Network
    // -----------------------------------------------------------------------

    section(6, "Input Rejected Before the Network");
    subsection("Submitting a mistyped principal; not one call leaves the machine...");

    let calls_before = ledger_backend.calls();
    let err = dashboard
        .submit_transfer("zzzzz-not-a-principal", "1")
        .await
        .unwrap_err();
    info("Error", &err.to_string());

    assert!(matches!(
        dashboard.transfer_phase(),
        TransferPhase::Rejected { .. }
    ));
    assert_eq!(ledger_backend.calls(), calls_before);
    dashboard.acknowledge_transfer();
    success("Rejected locally: zero ledger calls for malformed input");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Client Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Identities created", "2 (Alice, Bob)");
    info("Transfers submitted", "3 (1 recorded, 1 declined, 1 rejected locally)");
    info("Ledger calls made", &ledger_backend.calls().to_string());
    info("Signing algorithm", "Ed25519 (ed25519-dalek 2.1)");
    info("Principal derivation", "BLAKE3 over the public key, 0x02 tag");
    info("Text codec", "CRC-32 prefix + base32, dash-grouped");
    info("Amount scaling", "Truncating base-unit scaler (u128)");
    println!();

    println!("  {BOLD}{WHITE}Final Balances:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    balance_row("Alice", &display(ledger_backend.balance(&principal)), BLUE);
    balance_row("Bob", &display(ledger_backend.balance(&bob)), GREEN);

    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s{RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();
}
