//! Which profiles hold nothing worth keeping.

use crate::tree::{FlatMap, FlatValue};

/// Attributes that make a profile worth keeping when any of them is set.
pub const DELETABLE_PROFILE_FIELDS: &[&str] = &[
    "access_information.access_provider",
    "access_information.hris",
    "access_information.ldap",
    "access_information.mozilliansorg",
    "alternative_name",
    "description",
    "identities.bugzilla_mozilla_org_id",
    "identities.bugzilla_mozilla_org_primary_email",
    "identities.custom_1_primary_email",
    "identities.custom_2_primary_email",
    "identities.custom_3_primary_email",
    "identities.mozilla_ldap_id",
    "identities.mozilla_ldap_primary_email",
    "identities.mozilla_posix_id",
    "identities.mozilliansorg_id",
    "languages",
    "location",
    "pgp_public_keys",
    "phone_numbers",
    "picture",
    "pronouns",
    "staff_information.cost_center",
    "staff_information.director",
    "staff_information.manager",
    "staff_information.office_location",
    "staff_information.staff",
    "staff_information.team",
    "staff_information.title",
    "staff_information.worker_type",
    "staff_information.wpr_desk_number",
    "ssh_public_keys",
    "tags",
    "timezone",
    "uris",
];

/// Usernames with this prefix are placeholders and do not count.
const PLACEHOLDER_USERNAME_PREFIX: &str = "HACK#";

pub(crate) fn lookup<'a>(flat: &'a FlatMap, path: &str) -> Option<&'a FlatValue> {
    let mut segments = path.split('.');
    let mut value = flat.get(segments.next()?)?;
    for segment in segments {
        value = value.as_map()?.get(segment)?;
    }
    Some(value)
}

/// True iff every deletable-profile field is empty or absent.
pub fn is_deletable(flat: &FlatMap) -> bool {
    let fields_empty = DELETABLE_PROFILE_FIELDS
        .iter()
        .all(|path| lookup(flat, path).map_or(true, FlatValue::is_empty));

    let real_usernames = lookup(flat, "usernames")
        .and_then(FlatValue::members)
        .map_or(0, |members| {
            members
                .iter()
                .filter(|name| !name.starts_with(PLACEHOLDER_USERNAME_PREFIX))
                .count()
        });

    fields_empty && real_usernames == 0
}
