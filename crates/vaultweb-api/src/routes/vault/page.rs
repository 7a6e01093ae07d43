//! Vault page rendering
//!
//! Every record field is untrusted and goes through `escape_html` before it
//! reaches markup; ids placed in request paths are percent-encoded first.

use vaultweb_core::{AccountDraft, AccountRow, AccountUpdate, Dialog, DialogKind, VaultController};
use vaultweb_utils::{escape_html, path_segment};

/// Swap target shared by every control that re-renders the table and dialog
const REGION_SWAP: &str = "hx-target='#vault-region' hx-swap='outerHTML'";

const BUTTON: &str = "px-3 py-1 rounded-lg text-sm";

/// Full page: header, search bar and the vault region
pub fn render_vault_page(vault: &VaultController) -> String {
    let content = format!(
        r#"<div class='max-w-5xl mx-auto p-6'>
    <div class='flex items-center justify-between mb-6'>
        <h1 class='text-2xl font-bold text-indigo-600'>Vault</h1>
        <button id='addAccount' hx-get='/vault/dialogs/add' {swap}
            class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Add Account</button>
    </div>
    <input id='searchBar' name='search' type='search' placeholder='Search by URL' autocomplete='off'
        value='{search}' hx-post='/vault/search' hx-trigger='input' hx-target='#accountsTable' hx-swap='outerHTML'
        class='w-full mb-4 px-3 py-2 border rounded-lg'>
    {region}
</div>"#,
        swap = REGION_SWAP,
        search = escape_html(vault.search()),
        region = render_vault_region(vault),
    );

    crate::base_html("Accounts", &content)
}

/// Table plus whichever dialog is open
pub fn render_vault_region(vault: &VaultController) -> String {
    let load_notice = vault
        .load_notice()
        .map(|notice| {
            format!(
                "<div class='bg-red-50 border border-red-200 rounded-lg p-3 mb-4 text-sm text-red-700' role='alert'>{}</div>",
                escape_html(notice)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div id='vault-region'>
    {load_notice}
    <table class='w-full bg-white rounded-xl shadow-sm text-left'>
        <thead class='bg-gray-100 text-sm text-gray-600'>
            <tr><th class='px-4 py-2'>ID</th><th class='px-4 py-2'>Name</th><th class='px-4 py-2'>URL</th><th class='px-4 py-2'>Password</th><th class='px-4 py-2'>Actions</th></tr>
        </thead>
        {body}
    </table>
    {dialog}
</div>"#,
        load_notice = load_notice,
        body = render_table_body(vault),
        dialog = render_dialog(vault),
    )
}

/// One row per account, in listing order
pub fn render_table_body(vault: &VaultController) -> String {
    let rows: String = vault.rows().iter().map(render_row).collect();
    format!("<tbody id='accountsTable'>{}</tbody>", rows)
}

pub fn render_row(row: &AccountRow) -> String {
    let account = &row.account;
    let id = escape_html(&account.id);
    let name = escape_html(&account.name);
    let url = escape_html(&account.url);
    let password = escape_html(&account.password);
    let segment = path_segment(&account.id);
    let hidden = if row.shown { "" } else { " style='display: none'" };

    format!(
        r#"<tr class='border-t'{hidden}>
    <td class='px-4 py-2 text-gray-500'>{id}</td>
    <td class='px-4 py-2'>{name}</td>
    <td class='px-4 py-2'>{url}</td>
    <td class='px-4 py-2'><input type='{input_type}' id='password-{segment}' class='password-field bg-transparent' value='{password}' readonly></td>
    <td class='px-4 py-2 actions space-x-1'>
        <button hx-post='/vault/accounts/{segment}/toggle' hx-target='closest tr' hx-swap='outerHTML' class='{button} bg-gray-100'>{label}</button>
        <button class='edit-btn {button} bg-indigo-50 text-indigo-700' hx-get='/vault/accounts/{segment}/edit' {swap}
            data-id='{id}' data-name='{name}' data-url='{url}' data-password='{password}'>Edit</button>
        <button hx-get='/vault/accounts/{segment}/delete' {swap} class='{button} bg-red-50 text-red-700'>Delete</button>
    </td>
</tr>"#,
        hidden = hidden,
        id = id,
        name = name,
        url = url,
        password = password,
        input_type = row.visibility.input_type(),
        segment = segment,
        label = row.visibility.label(),
        button = BUTTON,
        swap = REGION_SWAP,
    )
}

fn render_dialog(vault: &VaultController) -> String {
    let notice = vault
        .notice()
        .map(|notice| {
            format!(
                "<p class='text-sm text-red-600 mb-3' role='alert'>{}</p>",
                escape_html(notice)
            )
        })
        .unwrap_or_default();

    match vault.dialog() {
        Dialog::Closed => String::new(),
        Dialog::Add(draft) => modal(DialogKind::Add, "Add Account", &notice, &add_form(draft)),
        Dialog::Edit(update) => modal(DialogKind::Edit, "Edit Account", &notice, &edit_form(update)),
        Dialog::Delete { id } => {
            let label = vault
                .row(id)
                .map(|row| row.account.name.as_str())
                .unwrap_or(id.as_str());
            modal(DialogKind::Delete, "Delete Account", &notice, &delete_prompt(label))
        }
    }
}

/// Overlay that closes itself when clicked outside the content box
fn modal(kind: DialogKind, title: &str, notice: &str, body: &str) -> String {
    let dom_id = kind.dom_id();
    format!(
        r#"<div id='{dom_id}' class='modal fixed inset-0 bg-black bg-opacity-40 flex items-center justify-center'
    hx-post='/vault/dialogs/{kind}/close' hx-trigger="click[target.id=='{dom_id}']" {swap}>
    <div class='modal-content bg-white rounded-xl shadow-lg p-6 w-96'>
        <div class='flex items-center justify-between mb-4'>
            <h2 class='text-lg font-semibold'>{title}</h2>
            <button type='button' id='{kind}Close' class='close text-gray-400 hover:text-gray-600'
                hx-post='/vault/dialogs/{kind}/close' {swap}>&times;</button>
        </div>
        {notice}
        {body}
    </div>
</div>"#,
        dom_id = dom_id,
        kind = kind,
        swap = REGION_SWAP,
        title = title,
        notice = notice,
        body = body,
    )
}

fn field(id: &str, name: &str, label: &str, input_type: &str, value: &str) -> String {
    format!(
        r#"<label class='block mb-3'><span class='text-sm text-gray-600'>{label}</span>
            <input id='{id}' name='{name}' type='{input_type}' value='{value}' required class='w-full px-3 py-2 border rounded-lg'></label>"#,
        label = label,
        id = id,
        name = name,
        input_type = input_type,
        value = escape_html(value),
    )
}

fn submit_button(id: &str, label: &str) -> String {
    format!(
        "<button type='submit' id='{}' class='w-full py-2 bg-indigo-600 text-white rounded-lg'>{}</button>",
        id, label
    )
}

fn add_form(draft: &AccountDraft) -> String {
    format!(
        r#"<form id='addForm' hx-post='/vault/accounts' {swap} hx-disabled-elt='#addSubmit'>
            {name}{url}{password}{submit}
        </form>"#,
        swap = REGION_SWAP,
        name = field("addName", "name", "Name", "text", &draft.name),
        url = field("addUrl", "url", "URL", "text", &draft.url),
        password = field("addPassword", "password", "Password", "password", &draft.password),
        submit = submit_button("addSubmit", "Add"),
    )
}

fn edit_form(update: &AccountUpdate) -> String {
    format!(
        r#"<form id='editForm' hx-put='/vault/accounts' {swap} hx-disabled-elt='#editSubmit'>
            <input type='hidden' id='editId' name='id' value='{id}'>
            {name}{url}{password}{submit}
        </form>"#,
        swap = REGION_SWAP,
        id = escape_html(&update.id),
        name = field("editName", "name", "Name", "text", &update.name),
        url = field("editUrl", "url", "URL", "text", &update.url),
        password = field("editPassword", "password", "Password", "text", &update.password),
        submit = submit_button("editSubmit", "Save"),
    )
}

fn delete_prompt(label: &str) -> String {
    format!(
        r#"<p class='mb-4'>Delete <strong>{label}</strong>? This cannot be undone.</p>
        <div class='flex gap-2'>
            <button type='button' id='confirmDelete' hx-post='/vault/delete/confirm' {swap} hx-disabled-elt='this'
                class='flex-1 py-2 bg-red-600 text-white rounded-lg'>Delete</button>
            <button type='button' id='cancelDelete' hx-post='/vault/dialogs/delete/close' {swap}
                class='flex-1 py-2 bg-gray-100 rounded-lg'>Cancel</button>
        </div>"#,
        label = escape_html(label),
        swap = REGION_SWAP,
    )
}
