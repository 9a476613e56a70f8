use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Countries {
    Table,
    Id,
    Name,
    Alpha2,
    Alpha3,
    NumericCode,
}

#[derive(DeriveIden)]
enum CountryRegions {
    Table,
    Id,
    Name,
    CountryId,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Short,
    Name,
    ReceiverName,
    TargetAmount,
    MinimumDonation,
    PaypalCurrency,
    Datetime,
    Locked,
    PrizeAcceptDeadlineDelta,
}

#[derive(DeriveIden)]
enum EventAllowedCountries {
    Table,
    Id,
    EventId,
    CountryId,
}

#[derive(DeriveIden)]
enum EventDisallowedRegions {
    Table,
    Id,
    EventId,
    RegionId,
}

#[derive(DeriveIden)]
enum SpeedRuns {
    Table,
    Id,
    EventId,
    Name,
    Category,
    Order,
    Starttime,
    Endtime,
}

#[derive(DeriveIden)]
enum Donors {
    Table,
    Id,
    Email,
    Alias,
    Firstname,
    Lastname,
    PaypalEmail,
    Visibility,
    AddressStreet,
    AddressCity,
    AddressState,
    AddressZip,
    AddressCountryId,
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
    DonorId,
    EventId,
    Domain,
    DomainId,
    State,
    Amount,
    Fee,
    Currency,
    TimeReceived,
    Comment,
    CommentState,
    CommentLanguage,
    ReadState,
    TestDonation,
    ModComments,
}

#[derive(DeriveIden)]
enum DonorCaches {
    Table,
    Id,
    EventId,
    DonorId,
    DonationTotal,
    DonationCount,
    DonationAvg,
    DonationMax,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Countries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Countries::Name).string().not_null())
                    .col(ColumnDef::new(Countries::Alpha2).string_len(2).not_null())
                    .col(ColumnDef::new(Countries::Alpha3).string_len(3).not_null())
                    .col(ColumnDef::new(Countries::NumericCode).string_len(3).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_name_unique")
                    .table(Countries::Table)
                    .col(Countries::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_alpha2_unique")
                    .table(Countries::Table)
                    .col(Countries::Alpha2)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_countries_alpha3_unique")
                    .table(Countries::Table)
                    .col(Countries::Alpha3)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CountryRegions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CountryRegions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CountryRegions::Name).string().not_null())
                    .col(
                        ColumnDef::new(CountryRegions::CountryId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_country_region_country")
                            .from(CountryRegions::Table, CountryRegions::CountryId)
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_country_regions_country_name_unique")
                    .table(CountryRegions::Table)
                    .col(CountryRegions::CountryId)
                    .col(CountryRegions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::Short).string_len(64).not_null())
                    .col(ColumnDef::new(Events::Name).string().not_null())
                    .col(ColumnDef::new(Events::ReceiverName).string().not_null())
                    .col(
                        ColumnDef::new(Events::TargetAmount)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(Events::MinimumDonation)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("1.00"),
                    )
                    .col(
                        ColumnDef::new(Events::PaypalCurrency)
                            .string_len(8)
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(Events::Datetime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Events::PrizeAcceptDeadlineDelta)
                            .integer()
                            .not_null()
                            .default(14),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_short_unique")
                    .table(Events::Table)
                    .col(Events::Short)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventAllowedCountries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventAllowedCountries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventAllowedCountries::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventAllowedCountries::CountryId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_allowed_country_event")
                            .from(EventAllowedCountries::Table, EventAllowedCountries::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_allowed_country_country")
                            .from(
                                EventAllowedCountries::Table,
                                EventAllowedCountries::CountryId,
                            )
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_allowed_countries_unique")
                    .table(EventAllowedCountries::Table)
                    .col(EventAllowedCountries::EventId)
                    .col(EventAllowedCountries::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventDisallowedRegions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventDisallowedRegions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventDisallowedRegions::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventDisallowedRegions::RegionId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_disallowed_region_event")
                            .from(EventDisallowedRegions::Table, EventDisallowedRegions::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_disallowed_region_region")
                            .from(
                                EventDisallowedRegions::Table,
                                EventDisallowedRegions::RegionId,
                            )
                            .to(CountryRegions::Table, CountryRegions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_disallowed_regions_unique")
                    .table(EventDisallowedRegions::Table)
                    .col(EventDisallowedRegions::EventId)
                    .col(EventDisallowedRegions::RegionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SpeedRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpeedRuns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpeedRuns::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpeedRuns::Name).string().not_null())
                    .col(ColumnDef::new(SpeedRuns::Category).string().null())
                    .col(ColumnDef::new(SpeedRuns::Order).integer().null())
                    .col(
                        ColumnDef::new(SpeedRuns::Starttime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SpeedRuns::Endtime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_speed_run_event")
                            .from(SpeedRuns::Table, SpeedRuns::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_speed_runs_event")
                    .table(SpeedRuns::Table)
                    .col(SpeedRuns::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Donors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Donors::Email).string().not_null())
                    .col(ColumnDef::new(Donors::Alias).string().null())
                    .col(
                        ColumnDef::new(Donors::Firstname)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Donors::Lastname)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Donors::PaypalEmail).string().null())
                    .col(
                        ColumnDef::new(Donors::Visibility)
                            .string_len(32)
                            .not_null()
                            .default("FIRST"),
                    )
                    .col(
                        ColumnDef::new(Donors::AddressStreet)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Donors::AddressCity)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Donors::AddressState)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Donors::AddressZip)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Donors::AddressCountryId).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_address_country")
                            .from(Donors::Table, Donors::AddressCountryId)
                            .to(Countries::Table, Countries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donors_email_unique")
                    .table(Donors::Table)
                    .col(Donors::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donors_paypal_email_unique")
                    .table(Donors::Table)
                    .col(Donors::PaypalEmail)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Donations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Donations::DonorId).big_integer().null())
                    .col(
                        ColumnDef::new(Donations::EventId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donations::Domain)
                            .string_len(32)
                            .not_null()
                            .default("LOCAL"),
                    )
                    .col(
                        ColumnDef::new(Donations::DomainId)
                            .string_len(160)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donations::State)
                            .string_len(32)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Donations::Amount)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donations::Fee)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(Donations::Currency)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donations::TimeReceived)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donations::Comment)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Donations::CommentState)
                            .string_len(32)
                            .not_null()
                            .default("ABSENT"),
                    )
                    .col(
                        ColumnDef::new(Donations::CommentLanguage)
                            .string_len(2)
                            .not_null()
                            .default("un"),
                    )
                    .col(
                        ColumnDef::new(Donations::ReadState)
                            .string_len(32)
                            .not_null()
                            .default("READY"),
                    )
                    .col(
                        ColumnDef::new(Donations::TestDonation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Donations::ModComments)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_donor")
                            .from(Donations::Table, Donations::DonorId)
                            .to(Donors::Table, Donors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_event")
                            .from(Donations::Table, Donations::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // dedup key for at-least-once processor callbacks
        manager
            .create_index(
                Index::create()
                    .name("idx_donations_domain_domain_id_unique")
                    .table(Donations::Table)
                    .col(Donations::Domain)
                    .col(Donations::DomainId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donations_event_state")
                    .table(Donations::Table)
                    .col(Donations::EventId)
                    .col(Donations::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donations_donor")
                    .table(Donations::Table)
                    .col(Donations::DonorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DonorCaches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DonorCaches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DonorCaches::EventId).big_integer().null())
                    .col(
                        ColumnDef::new(DonorCaches::DonorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DonorCaches::DonationTotal)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(DonorCaches::DonationCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DonorCaches::DonationAvg)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(DonorCaches::DonationMax)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_cache_event")
                            .from(DonorCaches::Table, DonorCaches::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donor_cache_donor")
                            .from(DonorCaches::Table, DonorCaches::DonorId)
                            .to(Donors::Table, Donors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // one aggregate row per (event, donor); the global row has NULL event
        manager
            .create_index(
                Index::create()
                    .name("idx_donor_caches_event_donor_unique")
                    .table(DonorCaches::Table)
                    .col(DonorCaches::EventId)
                    .col(DonorCaches::DonorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(DonorCaches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Donations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Donors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(SpeedRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(EventDisallowedRegions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(EventAllowedCountries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(CountryRegions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Countries::Table).to_owned())
            .await?;
        Ok(())
    }
}
